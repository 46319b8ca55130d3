//! # Shopfloor CLI Application
//!
//! Command-line front end for the shop calculators and the shop data file.
//!
//! ```text
//! calc_cli cutting material=C45 d=20 vc=180 f=0.2 save=1
//! calc_cli history list
//! calc_cli export what=history out=history.csv
//! calc_cli chat "best insert grade for 316L?"
//! ```
//!
//! Results print as a short summary followed by the full JSON. Logs go to
//! stderr; set `RUST_LOG` or `log_filter` in `shopfloor.toml` to tune them.

mod args;
mod commands;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chrono::Utc;
use serde_json::Value;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use calc_core::ai::{ChatClient, ChatMessage, Difficulty, QuizRequest};
use calc_core::export::{export_history_csv, export_machines_csv};
use calc_core::file_io::load_or_create;
use calc_core::machines::{Machine, MachineType};
use calc_core::materials::MaterialCategory;
use calc_core::{save_shop, AppConfig, CalcError, CalcResult, FileLock, ShopData};

use args::Args;
use commands::{build_item, module_key, summary_fields, CALCULATORS};

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .try_init();
}

fn prompt_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    io::stdout().flush().ok()?;

    let mut input = String::new();
    match io::stdin().lock().read_line(&mut input) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(input.trim().to_string()),
    }
}

fn print_usage() {
    println!("Shopfloor CLI - Machining Shop Calculator");
    println!("=========================================");
    println!();
    println!("Calculators (add save=1 to keep the result in history):");
    for (name, usage) in CALCULATORS {
        println!("  {:<10} {}", name, usage);
    }
    println!();
    println!("Shop data:");
    println!("  materials  [category]");
    println!("  machines   list | add code= name= type= power= min= max= [rate=] | remove code=");
    println!("  history    list [type=] [n=] | summary | delete id= | clear");
    println!("  export     what=history|machines out=FILE");
    println!("  menu       [user=]");
    println!();
    println!("Assistant:");
    println!("  chat       <question>");
    println!("  quiz       topic= [difficulty=easy|medium|hard count=5]");
}

/// Open the shop file for a change, apply it, and save under the file lock.
fn with_shop_mut<T, F>(config: &AppConfig, change: F) -> CalcResult<T>
where
    F: FnOnce(&mut ShopData) -> CalcResult<T>,
{
    let _lock = FileLock::acquire(&config.data_file, config.user.clone())?;
    let mut shop = load_or_create(&config.data_file, &config.shop_name, &config.user)?;
    let out = change(&mut shop)?;
    shop.touch();
    save_shop(&shop, &config.data_file)?;
    Ok(out)
}

fn require_access(shop: &ShopData, user: &str, module: &str) -> CalcResult<()> {
    match shop.permissions.get(user) {
        Some(permission) if permission.can_access(module) => Ok(()),
        _ => Err(CalcError::permission_denied(user, module)),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(x) if x.fract() == 0.0 && x.abs() < 1e12 => format!("{}", x as i64),
            Some(x) => format!("{:.3}", x),
            None => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Bool(b) => status_icon(!*b).to_string(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

fn print_result(calc_type: &str, label: &str, result: &Value) {
    println!("═══════════════════════════════════════");
    println!("  {} - {}", calc_type.to_uppercase(), label);
    println!("═══════════════════════════════════════");
    for (caption, pointer, unit) in summary_fields(calc_type) {
        if let Some(value) = result.pointer(pointer) {
            println!("  {:<22} {} {}", caption, display_value(value), unit);
        }
    }
    if let Some(check) = result.get("machine_check") {
        let overloaded = check.get("overloaded").and_then(Value::as_bool).unwrap_or(false);
        let limited = check.get("rpm_limited").and_then(Value::as_bool).unwrap_or(false);
        println!();
        println!(
            "  Machine {}: rpm {} power {}",
            check.get("machine_code").map(display_value).unwrap_or_default(),
            if limited { "[LIMITED]" } else { "[OK]" },
            status_icon(!overloaded)
        );
    }
    println!();
    println!("JSON Output (for LLM/API use):");
    if let Ok(json) = serde_json::to_string_pretty(result) {
        println!("{}", json);
    }
}

fn run_calculator(config: &AppConfig, command: &str, args: &Args) -> CalcResult<bool> {
    let shop = load_or_create(&config.data_file, &config.shop_name, &config.user)?;
    let Some(item) = build_item(command, args, &shop)? else {
        return Ok(false);
    };
    require_access(&shop, &config.user, module_key(command))?;

    let result = if args.flag("save") {
        let (id, result) = with_shop_mut(config, |shop| shop.record(item.clone()))?;
        tracing::info!(%id, calc_type = item.calc_type(), "calculation saved");
        result
    } else {
        shop.evaluate(&item)?
    };
    print_result(item.calc_type(), item.label(), &result);
    Ok(true)
}

fn materials_command(config: &AppConfig, args: &Args) -> CalcResult<()> {
    let shop = load_or_create(&config.data_file, &config.shop_name, &config.user)?;
    let wanted = args.positional.get(1).map(|s| s.to_lowercase());
    let category = match wanted.as_deref() {
        Some(name) => Some(
            MaterialCategory::ALL
                .into_iter()
                .find(|c| {
                    c.display_name().to_lowercase() == name
                        || c.iso_code().map(|l| l.to_ascii_lowercase().to_string()).as_deref() == Some(name)
                })
                .ok_or_else(|| CalcError::invalid_input("category", name, "Unknown material category"))?,
        ),
        None => None,
    };
    let rows = match category {
        Some(c) => shop.materials.by_category(c),
        None => shop.materials.all(),
    };
    println!("{:<18} {:<12} {:>6} {:>13} {:>8} {:>8}", "Material", "Group", "HB", "Vc (m/min)", "kc1", "TL/kg");
    for m in rows {
        println!(
            "{:<18} {:<12} {:>6.0} {:>6.0}-{:<6.0} {:>8.0} {:>8.2}{}",
            m.name,
            m.category.display_name(),
            m.hardness_hb,
            m.cutting_speed_min,
            m.cutting_speed_max,
            m.kc1,
            m.price_per_kg,
            if m.custom { " *" } else { "" }
        );
    }
    Ok(())
}

fn machines_command(config: &AppConfig, args: &Args) -> CalcResult<()> {
    match args.positional.get(1).map(String::as_str).unwrap_or("list") {
        "list" => {
            let shop = load_or_create(&config.data_file, &config.shop_name, &config.user)?;
            println!("{:<8} {:<24} {:<12} {:>7} {:>13} {:>8}", "Code", "Name", "Type", "kW", "rpm", "Rate");
            for m in shop.machines_sorted() {
                println!(
                    "{:<8} {:<24} {:<12} {:>7.1} {:>6.0}-{:<6.0} {:>8.0}{}",
                    m.code,
                    m.name,
                    m.machine_type.display_name(),
                    m.power_kw,
                    m.min_rpm,
                    m.max_rpm,
                    m.hourly_rate,
                    if m.active { "" } else { " (inactive)" }
                );
            }
            Ok(())
        }
        "add" => {
            let machine_type = MachineType::from_str_flexible(&args.text_or("type", "lathe"))?;
            let machine = Machine::new(
                args.text_or("code", ""),
                args.text_or("name", ""),
                machine_type,
                args.num("power", 0.0),
                args.num("min", 0.0),
                args.num("max", 0.0),
            )
            .with_hourly_rate(args.num("rate", 0.0));
            let code = machine.code.clone();
            with_shop_mut(config, |shop| {
                shop.permissions.require_admin(&config.user, "add machine")?;
                shop.add_machine(machine)
            })?;
            println!("Machine {} added.", code);
            Ok(())
        }
        "remove" => {
            let code = args.text_or("code", "");
            let removed = with_shop_mut(config, |shop| {
                shop.permissions.require_admin(&config.user, "remove machine")?;
                let id = shop
                    .machine_by_code(&code)
                    .map(|m| m.id)
                    .ok_or_else(|| CalcError::not_found("machine", code.as_str()))?;
                shop.remove_machine(&id)
            })?;
            println!("Machine {} ({}) removed.", removed.code, removed.name);
            Ok(())
        }
        other => Err(CalcError::invalid_input("machines", other, "Use list, add or remove")),
    }
}

fn history_command(config: &AppConfig, args: &Args) -> CalcResult<()> {
    match args.positional.get(1).map(String::as_str).unwrap_or("list") {
        "list" => {
            let shop = load_or_create(&config.data_file, &config.shop_name, &config.user)?;
            let records = match args.text("type") {
                Some(calc_type) => shop.history.filter_type(calc_type),
                None => shop.history.recent(args.count("n", 20) as usize),
            };
            for r in records {
                println!(
                    "{}  {}  {:<10} {:<20} {}",
                    r.id,
                    r.created_at.format("%Y-%m-%d %H:%M"),
                    r.calc_type,
                    r.label,
                    r.material.as_deref().unwrap_or("")
                );
            }
            Ok(())
        }
        "summary" => {
            let shop = load_or_create(&config.data_file, &config.shop_name, &config.user)?;
            let summary = shop.history.summary(Utc::now());
            println!("Records:     {}", summary.total);
            println!("Last 7 days: {}", summary.last_7_days);
            for (calc_type, count) in &summary.by_type {
                println!("  {:<12} {}", calc_type, count);
            }
            Ok(())
        }
        "delete" => {
            let text = args.text_or("id", "");
            let id = Uuid::parse_str(&text).map_err(|_| CalcError::invalid_input("id", text.as_str(), "Not a record id"))?;
            let removed = with_shop_mut(config, |shop| shop.delete_record(&id))?;
            println!("Deleted {} ({}).", removed.label, removed.calc_type);
            Ok(())
        }
        "clear" => {
            let count = with_shop_mut(config, |shop| {
                shop.permissions.require_admin(&config.user, "clear history")?;
                Ok(shop.history.clear())
            })?;
            println!("Cleared {} records.", count);
            Ok(())
        }
        other => Err(CalcError::invalid_input("history", other, "Use list, summary, delete or clear")),
    }
}

fn export_command(config: &AppConfig, args: &Args) -> CalcResult<()> {
    let shop = load_or_create(&config.data_file, &config.shop_name, &config.user)?;
    let what = args.text_or("what", "history");
    let out = PathBuf::from(args.text_or("out", &format!("{}.csv", what)));
    let rows = match what.as_str() {
        "history" => export_history_csv(&shop.history, &out)?,
        "machines" => export_machines_csv(shop.machines_sorted(), &out)?,
        other => return Err(CalcError::invalid_input("what", other, "Use history or machines")),
    };
    println!("Wrote {} rows to {}", rows, out.display());
    Ok(())
}

fn menu_command(config: &AppConfig, args: &Args) -> CalcResult<()> {
    let shop = load_or_create(&config.data_file, &config.shop_name, &config.user)?;
    let user = args.text_or("user", &config.user);
    for category in shop.visible_menu(&user)? {
        println!("{}", category.title);
        for module in category.modules {
            println!("  {:<12} {}", module.key, module.title);
        }
    }
    Ok(())
}

async fn chat_command(config: &AppConfig, args: &Args) -> CalcResult<()> {
    let (url, key) = config.backend()?;
    let client = ChatClient::new(url, key)?;
    let question = args.positional[1..].join(" ");
    if question.trim().is_empty() {
        return Err(CalcError::missing_field("question"));
    }

    let mut out = io::stdout();
    client
        .stream_chat(&[ChatMessage::user(question)], |delta| {
            let _ = out.write_all(delta.as_bytes());
            let _ = out.flush();
        })
        .await?;
    println!();
    Ok(())
}

async fn quiz_command(config: &AppConfig, args: &Args) -> CalcResult<()> {
    let (url, key) = config.backend()?;
    let client = ChatClient::new(url, key)?;
    let difficulty = Difficulty::from_str_flexible(&args.text_or("difficulty", "medium"))?;
    let count = args.count("count", 5).min(u32::from(u8::MAX)) as u8;
    let request = QuizRequest::new(args.text_or("topic", "CNC machining"), difficulty, count);
    let quiz = client.generate_quiz(&request).await?;

    let mut answers = Vec::with_capacity(quiz.questions.len());
    for (i, q) in quiz.questions.iter().enumerate() {
        println!();
        println!("{}. {}", i + 1, q.question);
        for (j, option) in q.options.iter().enumerate() {
            println!("   {}) {}", (b'A' + j as u8) as char, option);
        }
        let answer = prompt_line("Answer: ").and_then(|a| {
            let letter = a.chars().next()?.to_ascii_uppercase();
            let index = (letter as u8).checked_sub(b'A')? as usize;
            (index < q.options.len()).then_some(index)
        });
        answers.push(answer);
    }

    let score = quiz.score(&answers);
    println!();
    println!("═══════════════════════════════════════");
    println!("  SCORE: {}/{} ({:.0}%)", score.correct, score.total, score.percent);
    println!("═══════════════════════════════════════");
    for i in &score.missed {
        let q = &quiz.questions[*i];
        println!("  {}. {}", i + 1, q.options[q.correct_index]);
        if let Some(explanation) = &q.explanation {
            println!("     {}", explanation);
        }
    }
    Ok(())
}

async fn run(config: &AppConfig, args: &Args) -> CalcResult<()> {
    let Some(command) = args.positional.first().map(String::as_str) else {
        print_usage();
        return Ok(());
    };
    match command {
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        "materials" => materials_command(config, args),
        "machines" => machines_command(config, args),
        "history" => history_command(config, args),
        "export" => export_command(config, args),
        "menu" => menu_command(config, args),
        "chat" => chat_command(config, args).await,
        "quiz" => quiz_command(config, args).await,
        other => {
            if run_calculator(config, other, args)? {
                Ok(())
            } else {
                print_usage();
                Err(CalcError::invalid_input("command", other, "Unknown command"))
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };
    init_logging(&config);

    let args = Args::parse(std::env::args().skip(1));
    tracing::debug!(data_file = %config.data_file.display(), user = %config.user, "starting");

    if let Err(e) = run(&config, &args).await {
        eprintln!("Error: {}", e.user_message());
        if let Ok(json) = serde_json::to_string_pretty(&e) {
            eprintln!();
            eprintln!("Error JSON:");
            eprintln!("{}", json);
        }
        std::process::exit(1);
    }
}

fn status_icon(pass: bool) -> &'static str {
    if pass { "[OK]" } else { "[FAIL]" }
}
