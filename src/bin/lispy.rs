use lispy::{cmdline, interpreter};

fn main() -> Result<(), cmdline::Error> {
    pretty_env_logger::init();
    let env = interpreter::bare_environment();
    interpreter::read_prelude(&env).expect("error reading prelude");
    let args = std::env::args().collect();
    cmdline::launch(args, &env)
}
