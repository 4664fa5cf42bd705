use anyhow::Result;

fn main() -> Result<()> {
  patterndiff_cli::execute_main()
}
