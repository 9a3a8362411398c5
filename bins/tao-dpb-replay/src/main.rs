//! tao-dpb-replay - 硬件解码参考帧管理回放工具
//!
//! 读取 JSON 场景, 按解码顺序重放图像提交, 输出每幅图像之后的帧存储槽位表、
//! 参考索引表与诊断信息, 用于离线复现驱动层的参考帧问题.

mod logging;
mod replay;
mod scenario;

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;

use scenario::Scenario;

/// Tao 硬件解码参考帧管理回放工具
#[derive(Parser, Debug)]
#[command(name = "tao-dpb-replay", version, about = "重放解码提交并输出 DPB 槽位表")]
struct Cli {
    /// 场景文件路径 (JSON)
    scenario: PathBuf,

    /// 输出 JSON 格式
    #[arg(long)]
    json: bool,

    /// 日志文件目录, 不指定则不写日志文件
    #[arg(long = "log-dir")]
    log_dir: Option<PathBuf>,

    /// 存在提交失败的图像时以非零状态退出
    #[arg(long)]
    strict: bool,

    /// 日志级别 (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init("tao-dpb-replay", cli.verbose, cli.log_dir.as_deref()) {
        eprintln!("警告: {e:#}");
    }

    match run(&cli) {
        Ok(failed) if cli.strict && failed > 0 => {
            eprintln!("错误: {failed} 幅图像提交失败");
            process::exit(2);
        }
        Ok(_) => {}
        Err(e) => {
            eprintln!("错误: {e:#}");
            process::exit(1);
        }
    }
}

/// 执行回放, 返回提交失败的图像数
fn run(cli: &Cli) -> Result<usize> {
    let scenario = Scenario::load(&cli.scenario)?;
    let report = replay::run(&scenario)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        replay::print_text(&report);
    }
    Ok(report.failed_count())
}
