use task_log::app;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = app::run() {
        log::error!("{:#}", err);
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
