use std::path::Path;
use std::process;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};

use kakeibo::expr;
use kakeibo::history::itemize::{DayCells, Itemizer};
use kakeibo::history::{log as histlog, merge};
use kakeibo::logging;
use kakeibo::sheet::{cell, memo::MemoGroup};
use kakeibo::{Amount, BookConfig, CellValue, Date};

fn main() {
    let matches = App::new("kakeibo")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Formula-ledger engine for a spreadsheet-backed household ledger")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("More logging (-v: debug, -vv: trace)"),
        )
        .subcommand(
            SubCommand::with_name("expand")
                .about("Expand a cell formula into one addend per transaction")
                .arg(Arg::with_name("FORMULA").required(true)),
        )
        .subcommand(
            SubCommand::with_name("cell")
                .about("Apply one arithmetic mutation to a cell's text")
                .setting(AppSettings::SubcommandRequiredElseHelp)
                .subcommand(
                    SubCommand::with_name("add")
                        .about("Append an amount to the cell")
                        .arg(Arg::with_name("CELL").required(true))
                        .arg(Arg::with_name("AMOUNT").required(true)),
                )
                .subcommand(
                    SubCommand::with_name("delete")
                        .about("Splice the last occurrence of an amount out of the cell")
                        .arg(Arg::with_name("CELL").required(true))
                        .arg(Arg::with_name("AMOUNT").required(true)),
                )
                .subcommand(
                    SubCommand::with_name("edit")
                        .about("Rewrite the last occurrence of an amount in place")
                        .arg(Arg::with_name("CELL").required(true))
                        .arg(Arg::with_name("OLD").required(true))
                        .arg(Arg::with_name("NEW").required(true)),
                ),
        )
        .subcommand(
            SubCommand::with_name("memo")
                .about("Apply one mutation to a day's memo slot pool")
                .setting(AppSettings::SubcommandRequiredElseHelp)
                .subcommand(
                    SubCommand::with_name("add")
                        .about("File a memo under a category")
                        .arg(Arg::with_name("CATEGORY").required(true))
                        .arg(Arg::with_name("TEXT").required(true))
                        .arg(Arg::with_name("SLOT").multiple(true)),
                )
                .subcommand(
                    SubCommand::with_name("delete")
                        .about("Remove the last occurrence of a memo")
                        .arg(Arg::with_name("CATEGORY").required(true))
                        .arg(Arg::with_name("TEXT").required(true))
                        .arg(Arg::with_name("SLOT").multiple(true)),
                )
                .subcommand(
                    SubCommand::with_name("edit")
                        .about("Replace the last occurrence of a memo")
                        .arg(Arg::with_name("CATEGORY").required(true))
                        .arg(Arg::with_name("OLD").required(true))
                        .arg(Arg::with_name("NEW").required(true))
                        .arg(Arg::with_name("SLOT").multiple(true)),
                ),
        )
        .subcommand(
            SubCommand::with_name("itemize")
                .about("Rebuild transaction records from a tab-separated grid dump")
                .arg(Arg::with_name("DUMP").required(true))
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .help("Write log rows here instead of stdout"),
                ),
        )
        .subcommand(
            SubCommand::with_name("merge")
                .about("Merge history logs into one canonical log")
                .arg(Arg::with_name("LOG").required(true).multiple(true))
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .help("Write the canonical log here instead of stdout"),
                ),
        )
        .subcommand(
            SubCommand::with_name("recent")
                .about("Latest distinct transactions of a history log")
                .arg(Arg::with_name("LOG").required(true))
                .arg(Arg::with_name("count").short("n").takes_value(true)),
        )
        .subcommand(
            SubCommand::with_name("frequent")
                .about("Most repeated transactions of a history log")
                .arg(Arg::with_name("LOG").required(true))
                .arg(Arg::with_name("count").short("n").takes_value(true)),
        )
        .get_matches();

    let _logger = match logging::init(matches.occurrences_of("verbose")) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("could not start logging: {}", e);
            process::exit(1);
        }
    };

    let outcome = match matches.subcommand() {
        ("expand", Some(sub)) => run_expand(sub),
        ("cell", Some(sub)) => run_cell(sub),
        ("memo", Some(sub)) => run_memo(sub),
        ("itemize", Some(sub)) => run_itemize(sub),
        ("merge", Some(sub)) => run_merge(sub),
        ("recent", Some(sub)) => run_suggest(sub, false),
        ("frequent", Some(sub)) => run_suggest(sub, true),
        _ => unreachable!(),
    };
    if let Err(msg) = outcome {
        eprintln!("{}", msg);
        process::exit(1);
    }
}

/// The book geometry used by the file-level commands
///
/// Real deployments describe their own book; loading that description is
/// the caller's job, not the engine's.
fn default_config() -> BookConfig {
    let names = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
    BookConfig {
        categories: names(&[
            "Salary", "Rent", "Utilities", "Food", "Daily", "Transport", "Medical", "Social",
            "Hobby", "Clothing", "Special",
        ]),
        amount_row: 31,
        memo_row: 51,
        memo_slots: 4,
        memo_threshold: 500,
        memo_threshold_categories: names(&["Transport", "Special"]),
        exclude_categories: names(&["Salary"]),
    }
}

fn parse_amount(s: &str) -> Result<Amount, String> {
    s.trim()
        .parse::<i64>()
        .map(Amount)
        .map_err(|_| format!("'{}' is not an integer amount", s))
}

fn run_expand(matches: &ArgMatches) -> Result<(), String> {
    let formula = matches.value_of("FORMULA").unwrap();
    println!("{}", expr::expand(formula));
    Ok(())
}

fn run_cell(matches: &ArgMatches) -> Result<(), String> {
    let next = match matches.subcommand() {
        ("add", Some(sub)) => {
            let current = CellValue::from_raw(sub.value_of("CELL").unwrap());
            let amount = parse_amount(sub.value_of("AMOUNT").unwrap())?;
            cell::add(&current, amount)
        }
        ("delete", Some(sub)) => {
            let current = CellValue::from_raw(sub.value_of("CELL").unwrap());
            let amount = parse_amount(sub.value_of("AMOUNT").unwrap())?;
            cell::delete(&current, amount).map_err(|e| e.to_string())?
        }
        ("edit", Some(sub)) => {
            let current = CellValue::from_raw(sub.value_of("CELL").unwrap());
            let old = parse_amount(sub.value_of("OLD").unwrap())?;
            let new = parse_amount(sub.value_of("NEW").unwrap())?;
            cell::edit(&current, old, new).map_err(|e| e.to_string())?
        }
        _ => unreachable!(),
    };
    println!("{}", next);
    Ok(())
}

fn run_memo(matches: &ArgMatches) -> Result<(), String> {
    let config = default_config();
    let slots_of = |sub: &ArgMatches| -> Vec<String> {
        let mut slots: Vec<String> = sub
            .values_of("SLOT")
            .map(|v| v.map(|s| s.to_string()).collect())
            .unwrap_or_default();
        slots.resize(config.memo_slots, String::new());
        slots
    };
    let write = match matches.subcommand() {
        ("add", Some(sub)) => MemoGroup::new(slots_of(sub))
            .add(sub.value_of("CATEGORY").unwrap(), sub.value_of("TEXT").unwrap()),
        ("delete", Some(sub)) => MemoGroup::new(slots_of(sub))
            .delete(sub.value_of("CATEGORY").unwrap(), sub.value_of("TEXT").unwrap()),
        ("edit", Some(sub)) => MemoGroup::new(slots_of(sub)).edit(
            sub.value_of("CATEGORY").unwrap(),
            sub.value_of("OLD").unwrap(),
            sub.value_of("NEW").unwrap(),
        ),
        _ => unreachable!(),
    }
    .map_err(|e| e.to_string())?;
    println!("{}\t{}", write.index, write.value);
    Ok(())
}

/// One dump line: date, the category cells in order, then the memo slots
fn parse_dump_line(line: &str, config: &BookConfig) -> Result<DayCells, String> {
    let mut fields = line.split('\t');
    let date = fields
        .next()
        .ok_or_else(|| "empty dump line".to_string())?
        .parse::<Date>()
        .map_err(|e| e.to_string())?;
    let mut fields: Vec<&str> = fields.collect();
    fields.resize(config.categories.len() + config.memo_slots, "");
    let (cells, memos) = fields.split_at(config.categories.len());
    Ok(DayCells {
        date,
        cells: cells.iter().map(|c| CellValue::from_raw(c)).collect(),
        memos: memos.iter().map(|m| m.to_string()).collect(),
    })
}

fn run_itemize(matches: &ArgMatches) -> Result<(), String> {
    let config = default_config();
    let path = matches.value_of("DUMP").unwrap();
    let contents = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path, e))?;
    let mut days = Vec::new();
    for line in contents.lines().filter(|l| !l.trim().is_empty()) {
        days.push(parse_dump_line(line, &config)?);
    }
    let records = Itemizer::new(&config).run(&days);
    match matches.value_of("output") {
        Some(out) => histlog::write_log(Path::new(out), &records)
            .map_err(|e| format!("{}: {}", out, e))?,
        None => {
            for record in &records {
                println!("{}", histlog::format_row(record));
            }
        }
    }
    Ok(())
}

fn run_merge(matches: &ArgMatches) -> Result<(), String> {
    let mut sources = Vec::new();
    for path in matches.values_of("LOG").unwrap() {
        let rows = histlog::read_log(Path::new(path)).map_err(|e| format!("{}: {}", path, e))?;
        sources.push(rows);
    }
    let merged = merge::merge(&sources);
    match matches.value_of("output") {
        Some(out) => histlog::write_log(Path::new(out), &merged)
            .map_err(|e| format!("{}: {}", out, e))?,
        None => {
            for record in &merged {
                println!("{}", histlog::format_row(record));
            }
        }
    }
    Ok(())
}

fn run_suggest(matches: &ArgMatches, by_frequency: bool) -> Result<(), String> {
    let path = matches.value_of("LOG").unwrap();
    let count = match matches.value_of("count") {
        Some(n) => n
            .parse::<usize>()
            .map_err(|_| format!("'{}' is not a count", n))?,
        None => 8,
    };
    let records = histlog::read_log(Path::new(path)).map_err(|e| format!("{}: {}", path, e))?;
    let suggestions = if by_frequency {
        histlog::frequent(&records, count)
    } else {
        histlog::recent(&records, count)
    };
    for s in suggestions {
        if s.memo.is_empty() {
            println!("{}, {}", s.category, s.amount);
        } else {
            println!("{}: {}, {}", s.category, s.memo, s.amount);
        }
    }
    Ok(())
}
