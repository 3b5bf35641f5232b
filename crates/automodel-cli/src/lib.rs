mod cli;
mod config;
mod database_cmd;
mod format;
mod generate;
mod init;
mod registry;
mod render;
mod table_cmd;
mod type_mapper;
mod write;

pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Init(args) => init::run(args),
        cli::Command::Database(args) => database_cmd::run(args).await,
        cli::Command::Table(args) => table_cmd::run(args).await,
    }
}
