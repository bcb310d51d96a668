use anyhow::Result;
use std::io::Write;
use tilekiln_container::TilesRuntime;

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
/// Print the TileJSON metadata of a container to stdout.
pub struct PrintTilejson {
	/// Input file
	#[arg(value_name = "INPUT_FILE")]
	input: String,

	/// Pretty-print the output
	#[arg(long, default_value_t = false, short = 'p')]
	pretty: bool,
}

pub async fn run(args: &PrintTilejson, runtime: TilesRuntime) -> Result<()> {
	let tilejson = fetch_tilejson(args, runtime).await?;
	std::io::stdout().write_all(tilejson.as_bytes())?;
	Ok(())
}

async fn fetch_tilejson(args: &PrintTilejson, runtime: TilesRuntime) -> Result<String> {
	let reader = runtime.get_reader_from_str(&args.input).await?;

	Ok(if args.pretty {
		reader.tilejson().as_pretty_lines(80).join("\n")
	} else {
		reader.tilejson().as_string()
	})
}
