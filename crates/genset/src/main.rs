mod dashboard;
mod runtime;

fn main() {
    runtime::run_from_args();
}
