mod schema;

use anyhow::Result;

fn main() -> Result<()> {
  schema::generate_schema()
}
