use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pss_config::{
    BackupManager, BuffParams, DocumentStore, LockManager, LockState, MutationEngine,
    MutationOutcome, PathResolver, RepairOutcome, Settings,
};

#[derive(Parser)]
#[command(name = "pss_config")]
#[command(about = "管理 PSS 角色配置文件：发现、锁定、一键修改与备份")]
#[command(version)]
struct Cli {
    /// 设置文件（JSON），缺省使用内置默认值
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// 静默模式(仅输出警告和错误)
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 列出根目录下的所有角色
    Characters { root: String },
    /// 列出角色的配置文件
    Documents { root: String, character: String },
    /// 递归搜索配置文件
    Search { dir: PathBuf },
    /// 列出配置文件中的挂机路径
    Paths { file: PathBuf },
    /// 显示锁定状态
    Status { file: PathBuf },
    /// 解除只读以便编辑
    Edit { file: PathBuf },
    /// 锁定配置
    Lock { file: PathBuf },
    /// 解锁配置
    Unlock { file: PathBuf },
    /// 一键无怪飞：用卷轴传送替换路径步骤
    Flight {
        file: PathBuf,
        /// 挂机路径名称
        #[arg(long)]
        path: String,
        /// 飞行卷轴 ID
        #[arg(long)]
        id: String,
        /// 完成后重新锁定
        #[arg(long)]
        relock: bool,
    },
    /// 一键自动换头盔
    Buffs {
        file: PathBuf,
        /// 挂机头盔名称
        #[arg(long)]
        afk: String,
        /// 力量头盔强化等级
        #[arg(long, default_value_t = 0)]
        str_level: u8,
        /// 敏捷头盔强化等级
        #[arg(long, default_value_t = 0)]
        agi_level: u8,
        /// 不加入敏捷补施条目
        #[arg(long)]
        no_retrigger: bool,
        /// 完成后重新锁定
        #[arg(long)]
        relock: bool,
    },
    /// 自动施放光箭
    MpSpell {
        file: PathBuf,
        /// 完成后重新锁定
        #[arg(long)]
        relock: bool,
    },
    /// 创建备份
    Backup { file: PathBuf },
    /// 从最新备份恢复
    Restore { file: PathBuf },
    /// 重新格式化并以 GBK 写回
    Normalize { file: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    let settings = match &cli.settings {
        Some(path) => Settings::load(path).with_context(|| format!("读取设置失败: {:?}", path))?,
        None => Settings::default(),
    };
    let store = DocumentStore::new();

    match cli.command {
        Command::Characters { root } => handle_characters(&store, settings, &root),
        Command::Documents { root, character } => {
            handle_documents(&store, settings, &root, &character)
        }
        Command::Search { dir } => {
            let found = PathResolver::new(store.fs(), settings).search_documents(&dir);
            if found.is_empty() {
                println!("未找到任何配置文件");
            }
            for path in found {
                println!("{}", path.display());
            }
            Ok(())
        }
        Command::Paths { file } => handle_paths(&store, &file),
        Command::Status { file } => {
            let loaded = store.open(&file)?;
            println!("{}: {}", file.display(), describe_state(loaded.lock_state));
            Ok(())
        }
        Command::Edit { file } => {
            let notice = LockManager::new(&store).open_for_edit(&file)?;
            if notice.was_readonly {
                println!("已解除只读: {}", file.display());
            }
            if notice.relock_recommended {
                println!("文档记录为锁定状态，编辑完成后请执行 lock 重新锁定");
            }
            Ok(())
        }
        Command::Lock { file } => {
            let loaded = LockManager::new(&store).lock(&file)?;
            println!("配置已锁定: {}", describe_state(loaded.lock_state));
            Ok(())
        }
        Command::Unlock { file } => {
            let loaded = LockManager::new(&store).unlock(&file)?;
            println!("配置已解锁: {}", describe_state(loaded.lock_state));
            Ok(())
        }
        Command::Flight { file, path, id, relock } => {
            let outcome = MutationEngine::new(&store).inject_flight(&file, &path, &id)?;
            println!("已启用飞行: {} (ID {})", path, id.trim());
            finish_mutation(&store, &file, outcome, relock)
        }
        Command::Buffs {
            file,
            afk,
            str_level,
            agi_level,
            no_retrigger,
            relock,
        } => {
            let params = BuffParams {
                strength_level: str_level,
                agility_level: agi_level,
                afk_helmet: afk,
                agility_retrigger: !no_retrigger,
            };
            let outcome = MutationEngine::new(&store).compose_buffs(&file, &params)?;
            println!("已启用自动换头盔 ({} 个槽位)", outcome.loaded.document.buff_slots().len());
            finish_mutation(&store, &file, outcome, relock)
        }
        Command::MpSpell { file, relock } => {
            let outcome = MutationEngine::new(&store).bind_mp_spell(&file)?;
            println!("已启用自动施放光箭");
            finish_mutation(&store, &file, outcome, relock)
        }
        Command::Backup { file } => {
            let name = BackupManager::new(&store).backup(&file)?;
            println!("已创建备份文件: {}", name);
            Ok(())
        }
        Command::Restore { file } => {
            let loaded = BackupManager::new(&store).restore(&file)?;
            println!("已恢复: {} ({})", file.display(), describe_state(loaded.lock_state));
            Ok(())
        }
        Command::Normalize { file } => {
            let document = store.load(&file)?;
            store.save(&file, &document)?;
            println!("已重新写入: {}", file.display());
            Ok(())
        }
    }
}

/// 初始化日志（RUST_LOG 优先）
fn init_tracing(quiet: bool) {
    let default = if quiet { "pss_config=warn" } else { "pss_config=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_characters(store: &DocumentStore, settings: Settings, root: &str) -> anyhow::Result<()> {
    let discovery = PathResolver::new(store.fs(), settings).resolve_characters(root);
    if let Some(reason) = discovery.reason {
        println!("{}", reason);
        return Ok(());
    }
    for character in discovery.items {
        println!("{}", character.name);
    }
    Ok(())
}

fn handle_documents(
    store: &DocumentStore,
    settings: Settings,
    root: &str,
    character: &str,
) -> anyhow::Result<()> {
    let discovery = PathResolver::new(store.fs(), settings).resolve_documents(root, character);
    if let Some(reason) = discovery.reason {
        println!("{}", reason);
        return Ok(());
    }
    for document in discovery.items {
        println!("{}", document.path.display());
    }
    Ok(())
}

fn handle_paths(store: &DocumentStore, file: &Path) -> anyhow::Result<()> {
    let records = MutationEngine::new(store).path_records(file)?;
    if records.is_empty() {
        println!("没有挂机路径");
    }
    for record in records {
        let note = match record.outcome {
            RepairOutcome::Clean => "",
            RepairOutcome::Recovered => " (已修复乱码)",
            RepairOutcome::Sanitized => " (已去除异常字符)",
            RepairOutcome::Placeholder => " (名称无法识别)",
        };
        println!("{}. {} [{} 步]{}", record.index + 1, record.display_name, record.step_count, note);
    }
    Ok(())
}

/// 一键操作完成后：按需重新锁定，否则提示
fn finish_mutation(
    store: &DocumentStore,
    file: &Path,
    outcome: MutationOutcome,
    relock: bool,
) -> anyhow::Result<()> {
    if relock {
        let loaded = LockManager::new(store).lock(file)?;
        println!("已重新锁定: {}", describe_state(loaded.lock_state));
    } else if outcome.notice.relock_recommended {
        println!("配置原本已锁定，现为可写状态；请执行 lock 重新锁定");
    }
    Ok(())
}

fn describe_state(state: LockState) -> &'static str {
    match state {
        LockState::Unlocked => "未锁定",
        LockState::Locked => "已锁定",
        LockState::EditingLocked => "编辑中（记录为锁定，文件可写）",
        LockState::ReadOnlyUnrecorded => "只读（无锁定记录）",
    }
}
