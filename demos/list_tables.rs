use anyhow::{bail, Result};
use mdb_pl::MdbTools;

fn main() -> Result<()> {
    env_logger::init();

    let Some(db_file) = std::env::args().nth(1) else {
        bail!("usage: list_tables <database.mdb>");
    };

    let tools = MdbTools::default();
    for table in tools.list_tables(&db_file)? {
        println!("{table}");
    }

    Ok(())
}
