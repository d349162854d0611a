use anyhow::{bail, Result};
use mdb_pl::MdbTools;

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let (Some(db_file), Some(table)) = (args.next(), args.next()) else {
        bail!("usage: describe_table <database.mdb> <table>");
    };

    let tools = MdbTools::default();
    let summary = tools.summarize_table(&db_file, &table, true)?;

    println!("{} ({} columns)", summary.table, summary.n_columns());
    for (i, column) in summary.columns.iter().enumerate() {
        match &column.polars_type {
            Some(dtype) => println!(
                "{:3}: {} ({}) -> {dtype:?}",
                i + 1,
                column.name,
                column.declared_type
            ),
            None => println!(
                "{:3}: {} ({}) -> unhinted",
                i + 1,
                column.name,
                column.declared_type
            ),
        }
    }

    Ok(())
}
