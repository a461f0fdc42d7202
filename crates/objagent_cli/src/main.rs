//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `objagent_core` linkage.
//! - Run one agent round trip against an in-memory database.

use objagent_core::db::open_db_in_memory;
use objagent_core::{
    ClassMetadata, Comparator, Direction, Expression, Mapper, ObjectAgent, Query, Record,
    SqliteEntityManager, StorageAgent,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("objagent_core ping={}", objagent_core::ping());
    println!("objagent_core version={}", objagent_core::core_version());

    match round_trip() {
        Ok(summary) => {
            println!("objagent_core round_trip={summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("objagent_core round_trip failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn round_trip() -> Result<String, Box<dyn Error>> {
    let mut mapper = Mapper::new();
    mapper.register(ClassMetadata::new("page", "pages", ["title"]))?;
    let conn = open_db_in_memory(&mapper)?;
    let agent = StorageAgent::new(SqliteEntityManager::new(&conn, mapper));

    for title in ["Hello", "World"] {
        agent.persist(&mut Record::new("page").with("title", title))?;
    }

    let query = Query::new("page")
        .with_expression(Expression::comparison(Comparator::Contains, "title", "%o%"))
        .order_by("title", Direction::Desc);
    let titles = agent
        .query(&query)?
        .iter()
        .filter_map(|page| page.get("title").map(ToString::to_string))
        .collect::<Vec<_>>();

    Ok(format!(
        "count={} titles={}",
        agent.query_count(&query)?,
        titles.join(",")
    ))
}
