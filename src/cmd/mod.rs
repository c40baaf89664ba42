//! 命令行 / Command line

pub mod preview;
pub mod server;
pub mod version;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// 命令行参数 / Command line arguments
#[derive(Parser, Debug)]
#[command(name = "alert-portal", author, version, about = "Admin portal: customers and schema-driven UI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 启动 HTTP 服务 / Run the HTTP server
    Server {
        /// 额外配置文件（TOML，必须存在）/ Extra TOML config file, must exist
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
    },
    /// 打印构建信息 / Print build metadata
    Version,
    /// 对运行中的 API 渲染资源列表 / Render a resource list against a running API
    Preview(preview::PreviewArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["alert-portal", "server", "--config", "local.toml"]).unwrap();
        assert!(matches!(cli.command, Command::Server { config: Some(ref p) } if p.ends_with("local.toml")));

        let cli = Cli::try_parse_from(["alert-portal", "preview", "--q", "acme"]).unwrap();
        match cli.command {
            Command::Preview(args) => {
                assert_eq!(args.api, preview::DEFAULT_API);
                assert_eq!(args.model, "customer");
                assert_eq!(args.q.as_deref(), Some("acme"));
                assert_eq!(args.endpoint_path(), "customers");
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(Cli::try_parse_from(["alert-portal"]).is_err());
    }
}
