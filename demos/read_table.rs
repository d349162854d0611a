use anyhow::{bail, Result};
use mdb_pl::{MdbTools, ReadOptions};

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let (Some(db_file), Some(table)) = (args.next(), args.next()) else {
        bail!("usage: read_table <database.mdb> <table>");
    };

    let tools = MdbTools::default();
    let df = tools.read_table(&db_file, &table, &ReadOptions::default())?;
    println!("{df}");
    println!("{} records x {} fields", df.height(), df.width());

    Ok(())
}
