use dotenvy::dotenv;
use log::info;
use upi_payment_server::{
    cli::{handle_command_line_args, Command},
    config::ServerConfig,
    server::{run_migrations, run_server},
};

#[actix_web::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let command = handle_command_line_args();
    if command == Command::Help {
        return;
    }
    let config = ServerConfig::from_env_or_default();
    let result = match command {
        Command::Migrate => {
            info!("🗃️ Running database migrations on {}", config.database_url);
            run_migrations(&config).await
        },
        _ => {
            info!("🚀️ Starting server on {}:{}", config.host, config.port);
            run_server(config).await
        },
    };
    match result {
        Ok(_) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}
