use std::path::Path;

use super::plural;

pub fn run(file: &Path) -> Result<(), String> {
    let blueprint = super::load(file)?;

    let flags = blueprint.session.flags().len();
    let events = blueprint.catalog.events().count();
    let conditions = blueprint.catalog.conditions().count();
    let roots = blueprint.catalog.roots().count();

    println!("  All checks passed for '{}'.", file.display());
    println!(
        "  {flags} flag{}, {events} event{}, {conditions} condition{} ({roots} root{})",
        plural(flags),
        plural(events),
        plural(conditions),
        plural(roots),
    );

    Ok(())
}
