use anyhow::Result;

use crate::cli::output::render_table;
use crate::schema::all_schemas;

pub fn handle_entities_command() -> Result<()> {
    let headers: Vec<String> = ["entity", "label", "endpoint", "import", "fields"]
        .iter()
        .map(|h| h.to_string())
        .collect();

    let rows: Vec<Vec<String>> = all_schemas()
        .iter()
        .map(|schema| {
            vec![
                schema.key.to_string(),
                schema.plural.to_string(),
                schema.endpoint.to_string(),
                if schema.supports_import() { "yes" } else { "no" }.to_string(),
                schema
                    .fields
                    .iter()
                    .map(|f| f.name)
                    .collect::<Vec<_>>()
                    .join(", "),
            ]
        })
        .collect();

    print!("{}", render_table(&headers, &rows));
    Ok(())
}
