use env_logger::WriteStyle;
use log::LevelFilter;
use std::io::Write;

/// Overrides the default `info` level of the crate's own messages, in `env_logger` filter syntax.
pub const LOG_ENV: &str = "KARTSIM_LOG";

pub fn try_init() -> Result<(), log::SetLoggerError> {
    env_logger::builder()
        .format(|buf, record| {
            writeln!(
                buf,
                "[KSIM | {} | {}] {}",
                record.level(),
                record.target().trim_start_matches("kartsim::"),
                record.args()
            )
        })
        .write_style(WriteStyle::Always)
        .filter(Some(env!("CARGO_PKG_NAME")), LevelFilter::Info)
        .parse_env(LOG_ENV)
        .try_init()
}
