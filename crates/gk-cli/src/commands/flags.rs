use std::path::Path;

use comfy_table::{ContentArrangement, Table};

pub fn run(file: &Path) -> Result<(), String> {
    let blueprint = super::load(file)?;
    let flags = blueprint.session.flags();

    if flags.is_empty() {
        println!("  No flags defined.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Key", "Kind", "Default", "Bounds"]);

    for flag in flags.iter() {
        let bounds = match flag.bounds() {
            Some((i64::MIN, i64::MAX)) => "unbounded".to_string(),
            Some((min, max)) => format!("{min}..={max}"),
            None => "-".to_string(),
        };
        table.add_row(vec![
            flag.key().to_string(),
            flag.kind().to_string(),
            flag.default_value().to_string(),
            bounds,
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} flag{}", flags.len(), super::plural(flags.len()));

    Ok(())
}
