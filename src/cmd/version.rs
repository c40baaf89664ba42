use crate::api::v1::version::build_info;

/// 处理 version 命令 / Handle the version command
pub fn handle_version_command() {
    let info = build_info();
    println!("alert-portal {}", info.version);
    println!("commit:   {}", info.commit);
    println!("built at: {}", info.built_at);
}
