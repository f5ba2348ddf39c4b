use anyhow::Result;
use census_lookup::census::{AcsGroup, Pl94171Group, describe, describe_acs, list_acs_tables, list_tables};

use crate::cli::VariablesArgs;

pub fn run(args: &VariablesArgs) -> Result<()> {
    if args.acs {
        println!("ACS 5-year tables:");
        for (table, title) in list_acs_tables() {
            println!("  {table:<10} {title}");
        }
        println!("\nGroups:");
        for group in AcsGroup::ALL {
            println!("  {:<18} {}", group.to_str(), group.description());
            for var in group.variables() {
                println!("    {var:<14} {}", describe_acs(&var).unwrap_or(""));
            }
        }
    } else {
        println!("PL 94-171 tables:");
        for (table, title) in list_tables() {
            println!("  {table:<10} {title}");
        }
        println!("\nGroups:");
        for group in Pl94171Group::ALL {
            println!("  {:<18} {}", group.to_str(), group.description());
        }
        println!("\nVariables:");
        for var in Pl94171Group::All.variables() {
            println!("  {var:<14} {}", describe(&var).unwrap_or(""));
        }
    }
    Ok(())
}
