//! 预览：用类型化客户端驱动资源编排器并打印渲染结果
//! Preview: drive the resource orchestrator through the typed client and print the markup

use std::sync::Arc;

use clap::Args;
use coe_ui::{ApiClient, CreateConfig, Notifier, ResourceState, ResourceView};

pub const DEFAULT_API: &str = "http://127.0.0.1:8080/api/v1";

#[derive(Args, Debug, Clone)]
pub struct PreviewArgs {
    /// API 基地址 / API base URL
    #[arg(long, default_value = DEFAULT_API)]
    pub api: String,
    /// 模型名 / Model name
    #[arg(long, default_value = "customer")]
    pub model: String,
    /// 资源路径，缺省为模型名复数 / Resource path, defaults to the plural model name
    #[arg(long)]
    pub path: Option<String>,
    /// 搜索词 / Search text
    #[arg(long)]
    pub q: Option<String>,
}

impl PreviewArgs {
    pub fn endpoint_path(&self) -> String {
        match &self.path {
            Some(p) if !p.trim().is_empty() => p.trim_matches('/').to_string(),
            _ => format!("{}s", self.model),
        }
    }
}

/// 处理 preview 命令 / Handle the preview command
pub async fn handle_preview_command(args: PreviewArgs, toast_max_visible: usize) -> anyhow::Result<()> {
    let client = ApiClient::new(&args.api)?;
    let notifier = Notifier::new(toast_max_visible);
    let endpoint = client.resource(&args.endpoint_path());

    let view = ResourceView::new(
        &args.model,
        Arc::new(client.clone()),
        Arc::new(endpoint.clone()),
        notifier.clone(),
    )
    .with_create(CreateConfig::new(Arc::new(endpoint)));

    view.mount().await;
    if let (Some(q), Some(list)) = (args.q.as_deref(), view.list()) {
        list.set_query(q);
        list.search_now().await;
    }

    println!("{}", view.render().render());
    for toast in notifier.drain() {
        eprintln!("[{}] {}", toast.title, toast.body);
    }

    let failed = matches!(view.state(), ResourceState::SchemaError { .. });
    view.unmount();
    notifier.shutdown();
    if failed {
        anyhow::bail!("no list schema available for model '{}'", args.model);
    }
    Ok(())
}
