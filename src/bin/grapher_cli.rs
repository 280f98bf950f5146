//! Simple CLI for inspecting and editing project files.
//!
//! Usage:
//!   grapher_cli <file> show
//!   grapher_cli <file> export
//!   grapher_cli <file> set <series> <row> <value>
//!   grapher_cli <file> add-series <name>
//!   grapher_cli <file> remove-series <name>
//!   grapher_cli <file> rename-series <old> <new>
//!   grapher_cli <file> insert-row <row>
//!   grapher_cli <file> remove-row <row>
//!   grapher_cli <file> sort <series>
//!   grapher_cli <file> title <text>
//!   grapher_cli <file> add-plottable <name> <x> <y>
//!
//! Set `RUST_LOG=debug` to see store activity on stderr.

use grapher_storage::{Config, PlottableData, Project, Result, SeriesId, SeriesRole};
use std::env;
use std::process::exit;
use tracing_subscriber::EnvFilter;

fn usage() -> ! {
    eprintln!("Usage: grapher_cli <file> <command> [args...]");
    eprintln!("Commands:");
    eprintln!("  show                          - Print the graph and the table");
    eprintln!("  export                        - Print the project as JSON");
    eprintln!("  set <series> <row> <value>    - Set a cell value");
    eprintln!("  add-series <name>             - Append an empty series");
    eprintln!("  remove-series <name>          - Remove a series");
    eprintln!("  rename-series <old> <new>     - Rename a series");
    eprintln!("  insert-row <row>              - Insert an empty row after <row>");
    eprintln!("  remove-row <row>              - Remove a data row");
    eprintln!("  sort <series>                 - Sort rows by a series");
    eprintln!("  title <text>                  - Set the graph title");
    eprintln!("  add-plottable <name> <x> <y>  - Add a data set plotting y against x");
    exit(1);
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("ERROR: {}", message);
    exit(1);
}

fn check(result: Result<()>) {
    match result {
        Ok(()) => println!("OK"),
        Err(e) => fail(e),
    }
}

fn series_named(project: &Project, name: &str) -> SeriesId {
    project
        .table()
        .series_by_name(name)
        .unwrap_or_else(|| fail(format!("no series named {:?}", name)))
}

fn arg_at(args: &[String], i: usize) -> &str {
    match args.get(i) {
        Some(value) => value,
        None => usage(),
    }
}

fn row_arg(arg: &str) -> usize {
    arg.parse()
        .unwrap_or_else(|_| fail(format!("invalid row {:?}", arg)))
}

fn show(project: &Project) -> Result<()> {
    let graph = project.graph();
    println!("title: {}", graph.title);
    println!("axes: {} / {}", graph.x_axis_title, graph.y_axis_title);
    println!("type: {:?}", graph.graph_type);

    let table = project.table();
    let columns = table
        .series_ids()
        .iter()
        .map(|&id| table.values(id))
        .collect::<Result<Vec<_>>>()?;

    let names: Vec<&str> = table
        .series_ids()
        .iter()
        .filter_map(|&id| table.series(id).map(|s| s.name()))
        .collect();
    println!("series: {}", names.join(" | "));
    for row in 0..table.row_count() {
        let cells: Vec<&str> = columns
            .iter()
            .map(|column| column.get(row).map_or("", String::as_str))
            .collect();
        println!("{:>4}: {}", row, cells.join(" | "));
    }

    for plottable in project.plottables() {
        let name_of = |role| {
            plottable
                .resolve(table, role)
                .map_or("-", |series| series.name())
        };
        println!(
            "plot {}: {} vs {}{}",
            plottable.name,
            name_of(SeriesRole::Y),
            name_of(SeriesRole::X),
            if plottable.active { "" } else { " (inactive)" }
        );
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        usage();
    }

    let path = &args[1];
    let command = &args[2];
    let arg = |i: usize| arg_at(&args, i);

    let mut project = match Project::open(Config::new(path)) {
        Ok(project) => project,
        Err(e) => fail(format!("Failed to open project: {}", e)),
    };

    match command.as_str() {
        "show" => {
            if let Err(e) = show(&project) {
                fail(e);
            }
        }

        "export" => {
            let snapshot = project.snapshot().unwrap_or_else(|e| fail(e));
            match serde_json::to_string_pretty(&snapshot) {
                Ok(json) => println!("{}", json),
                Err(e) => fail(e),
            }
        }

        "set" => {
            let series = series_named(&project, arg(3));
            let row = row_arg(arg(4));
            check(project.set_cell_value(series, row, arg(5)).map(|_| ()));
        }

        "add-series" => {
            check(project.add_series(arg(3)).map(|_| ()));
        }

        "remove-series" => {
            let series = series_named(&project, arg(3));
            check(project.remove_series(series));
        }

        "rename-series" => {
            let series = series_named(&project, arg(3));
            check(project.rename_series(series, arg(4)));
        }

        "insert-row" => {
            let row = row_arg(arg(3));
            check(project.insert_row_after(row).map(|_| ()));
        }

        "remove-row" => {
            let row = row_arg(arg(3));
            check(project.remove_row(row));
        }

        "sort" => {
            let series = series_named(&project, arg(3));
            match project.sort_by_series(series) {
                Ok(swaps) => println!("SWAPS: {}", swaps),
                Err(e) => fail(e),
            }
        }

        "title" => {
            let mut graph = project.graph().clone();
            graph.title = arg(3).to_string();
            check(project.set_graph(graph));
        }

        "add-plottable" => {
            let x = series_named(&project, arg(4));
            let y = series_named(&project, arg(5));
            let mut plottable = PlottableData::new(arg(3));
            plottable.set_series(SeriesRole::X, Some(x));
            plottable.set_series(SeriesRole::Y, Some(y));
            check(project.add_plottable(plottable).map(|_| ()));
        }

        _ => {
            eprintln!("Unknown command: {}", command);
            usage();
        }
    }

    if let Err(e) = project.close() {
        fail(e);
    }
}
