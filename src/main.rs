// ==========================================
// Kumex 切割车间 - 命令行入口
// ==========================================
// 职责: 解析命令行参数, 调用 API 层, 输出结果
// 红线: 不含业务规则, 全部操作经 AppState 上的 API 完成
// ==========================================

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use kumex_stock::api::{read_order_lines, ApiError, DeductOutcome, PlanRun};
use kumex_stock::config::config_manager::default_state_dir;
use kumex_stock::config::plan_constants::PlanConstants;
use kumex_stock::i18n;
use kumex_stock::{AppState, LedgerEntry, LedgerFilter, Material, MonthOrRange, YearMonth};

#[derive(Parser)]
#[command(name = "kumex", about = "Kumex cutting workshop: plans and POM stock ledger", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// 状态目录（默认: 用户数据目录下的 kumex）
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// 输出语言
    #[arg(long, global = true, default_value = i18n::DEFAULT_LOCALE)]
    lang: String,

    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Compute cutting plans from an order-line CSV
    Plan(PlanArgs),
    /// Post the month (or range) deduction and lock the period
    Deduct(DeductArgs),
    /// Manual stock intake
    Add(ManualArgs),
    /// Manual stock removal
    Sub(ManualArgs),
    /// Override the balance of a material
    Set(ManualArgs),
    /// Append the inverse of a manual ADD/SUB entry
    Undo(UndoArgs),
    /// Remove the deductions covering a month
    Unlock(UnlockArgs),
    /// Show current balances
    Balance,
    /// List ledger entries
    Ledger(LedgerArgs),
}

#[derive(Args)]
struct PlanArgs {
    /// 订单行 CSV
    #[arg(long)]
    lines: PathBuf,

    /// 锯缝宽度 mm（默认取配置文档）
    #[arg(long)]
    kerf: Option<Decimal>,

    /// 不写出报表
    #[arg(long)]
    no_reports: bool,
}

#[derive(Args)]
struct DeductArgs {
    #[arg(long, value_parser = parse_month, conflicts_with_all = ["from", "to"], required_unless_present = "from")]
    month: Option<YearMonth>,

    #[arg(long, value_parser = parse_month, requires = "to")]
    from: Option<YearMonth>,

    #[arg(long, value_parser = parse_month, requires = "from")]
    to: Option<YearMonth>,

    /// 由订单行计算扣减面积
    #[arg(long, conflicts_with_all = ["valge", "must"])]
    lines: Option<PathBuf>,

    /// 锯缝宽度 mm（仅与 --lines 一起使用）
    #[arg(long, requires = "lines")]
    kerf: Option<Decimal>,

    /// POM Valge 扣减面积 m²
    #[arg(long)]
    valge: Option<Decimal>,

    /// POM Must 扣减面积 m²
    #[arg(long)]
    must: Option<Decimal>,

    #[arg(long)]
    note: Option<String>,
}

#[derive(Args)]
struct ManualArgs {
    #[arg(long, value_parser = parse_material)]
    material: Material,

    /// 面积 m²
    #[arg(long, allow_negative_numbers = true)]
    amount: Decimal,

    /// 生效日期（默认今天）
    #[arg(long)]
    date: Option<NaiveDate>,

    #[arg(long, default_value = "")]
    note: String,
}

#[derive(Args)]
struct UndoArgs {
    entry_id: String,
}

#[derive(Args)]
struct UnlockArgs {
    #[arg(long, value_parser = parse_month)]
    month: YearMonth,
}

#[derive(Args)]
struct LedgerArgs {
    #[arg(long, value_parser = parse_month)]
    month: Option<YearMonth>,

    #[arg(long, value_parser = parse_material)]
    material: Option<Material>,
}

fn parse_month(s: &str) -> Result<YearMonth, String> {
    YearMonth::parse(s).ok_or_else(|| format!("expected YYYY-MM, got '{}'", s))
}

fn parse_material(s: &str) -> Result<Material, String> {
    Material::from_str(s).ok_or_else(|| {
        let known: Vec<&str> = Material::ALL.iter().map(|m| m.as_str()).collect();
        format!("unknown material '{}' (known: {})", s, known.join(", "))
    })
}

fn main() -> ExitCode {
    kumex_stock::logging::init();
    let cli = Cli::parse();
    i18n::set_locale(&cli.lang);

    tracing::debug!("{} {}", kumex_stock::APP_NAME, kumex_stock::VERSION);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ApiError>() {
                Some(api_error) => eprintln!("{}", api_error.user_message()),
                None => eprintln!("{:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let state_dir = cli.state_dir.unwrap_or_else(default_state_dir);
    let state = AppState::new(&state_dir, PlanConstants::default())?;
    let format = cli.format;

    match cli.command {
        Command::Plan(args) => {
            let lines = read_order_lines(&args.lines)?;
            let run = state.plan_api.run(&lines, args.kerf, !args.no_reports)?;
            print_plan(&run, format)?;
        }
        Command::Deduct(args) => {
            let period = match (args.month, args.from, args.to) {
                (Some(month), _, _) => MonthOrRange::Month(month),
                (None, Some(from), Some(to)) => MonthOrRange::Range { from, to },
                _ => anyhow::bail!("--month or --from/--to is required"),
            };
            let outcome = match &args.lines {
                Some(path) => {
                    let lines = read_order_lines(path)?;
                    let run = state.plan_api.run(&lines, args.kerf, false)?;
                    state
                        .stock_api
                        .deduct_plan(&run.outcome, period, args.note.as_deref())?
                }
                None => {
                    let amounts = [
                        (Material::PomValge, args.valge.unwrap_or(Decimal::ZERO)),
                        (Material::PomMust, args.must.unwrap_or(Decimal::ZERO)),
                    ];
                    let note = args.note.unwrap_or_default();
                    state.stock_api.try_deduct(&amounts, period, &note)?
                }
            };
            match outcome {
                DeductOutcome::NothingToDeduct => println!("{}", i18n::t("deduct.nothing")),
                DeductOutcome::Posted(entries) => {
                    let period_text = period
                        .months()
                        .iter()
                        .map(|m| m.to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    println!("{}", i18n::t_with_args("deduct.posted", &[("period", &period_text)]));
                    print_entries(&entries, format)?;
                }
            }
            warn_negative(&state)?;
        }
        Command::Add(args) => {
            let entry = state
                .stock_api
                .manual_add(args.material, args.amount, effective_date(args.date), &args.note)?;
            print_entries(std::slice::from_ref(&entry), format)?;
            warn_negative(&state)?;
        }
        Command::Sub(args) => {
            let entry = state
                .stock_api
                .manual_sub(args.material, args.amount, effective_date(args.date), &args.note)?;
            print_entries(std::slice::from_ref(&entry), format)?;
            warn_negative(&state)?;
        }
        Command::Set(args) => {
            let entry = state
                .stock_api
                .set_balance(args.material, args.amount, effective_date(args.date), &args.note)?;
            print_entries(std::slice::from_ref(&entry), format)?;
            warn_negative(&state)?;
        }
        Command::Undo(args) => {
            let entry = state.stock_api.undo_entry(&args.entry_id)?;
            print_entries(std::slice::from_ref(&entry), format)?;
            warn_negative(&state)?;
        }
        Command::Unlock(args) => {
            let removed = state.stock_api.unlock_month(args.month)?;
            println!(
                "{}",
                i18n::t_with_args(
                    "ledger.unlocked",
                    &[("count", &removed.to_string()), ("month", &args.month.to_string())],
                )
            );
        }
        Command::Balance => {
            let sheet = state.stock_api.balances()?;
            let locked = state.stock_api.locked_months()?;
            match format {
                OutputFormat::Json => {
                    let rounded: Vec<(Material, Decimal)> =
                        Material::ALL.iter().map(|m| (*m, sheet.rounded(*m))).collect();
                    let value = serde_json::json!({
                        "balances": rounded,
                        "closed_months": locked,
                    });
                    println!("{}", serde_json::to_string_pretty(&value)?);
                }
                OutputFormat::Text => {
                    for material in Material::ALL {
                        println!("{:<10} {:>10} m²", material, sheet.rounded(material));
                    }
                    let months: Vec<String> = locked.iter().map(|m| m.to_string()).collect();
                    println!("closed: {}", months.join(", "));
                }
            }
            warn_negative(&state)?;
        }
        Command::Ledger(args) => {
            let filter = LedgerFilter {
                material: args.material,
                month: args.month,
                ..LedgerFilter::default()
            };
            let entries = state.stock_api.read(&filter)?;
            print_entries(&entries, format)?;
        }
    }
    Ok(())
}

fn effective_date(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| chrono::Local::now().date_naive())
}

fn warn_negative(state: &AppState) -> anyhow::Result<()> {
    let sheet = state.stock_api.balances()?;
    for material in sheet.negatives() {
        eprintln!(
            "{}",
            i18n::t_with_args(
                "balance.negative",
                &[
                    ("material", material.as_str()),
                    ("balance", &sheet.rounded(material).to_string()),
                ],
            )
        );
    }
    Ok(())
}

fn print_plan(run: &PlanRun, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(run).context("serialize plan")?);
        }
        OutputFormat::Text => {
            println!("kerf: {} mm, skipped lines: {}", run.kerf_mm, run.skipped_lines);
            for plan in &run.outcome.plans {
                println!(
                    "{:<10} layers {:>3}  plates {:>3}  left {:>4}  ideal {:>8} m²  waste {:>8} m²",
                    plan.material,
                    plan.layers_used,
                    plan.plates_used,
                    plan.plates_left,
                    kumex_stock::domain::round_m2(plan.ideal_area_m2),
                    kumex_stock::domain::round_m2(plan.waste_width_area_m2),
                );
            }
            for issue in &run.outcome.issues {
                println!(
                    "! {} {:?} {}: {}",
                    issue.material, issue.dimensions, issue.code, issue.detail
                );
            }
            if let Some(files) = &run.reports {
                for path in files.all() {
                    println!("report: {}", path.display());
                }
            }
        }
    }
    Ok(())
}

fn print_entries(entries: &[LedgerEntry], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entries)?),
        OutputFormat::Text => {
            for e in entries {
                println!(
                    "{}  {}  {:<10} {:<13} {:>10}  {}",
                    e.entry_id, e.effective_date, e.material, e.op, e.amount_m2, e.note
                );
            }
        }
    }
    Ok(())
}
