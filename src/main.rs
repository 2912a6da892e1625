// hlslc command-line driver.

use std::env;
use std::process::ExitCode;

use hlslc::Target;

#[derive(Clone, Copy, PartialEq)]
enum OutputLanguage {
    Glsl,
    Hlsl,
}

fn print_usage() {
    eprintln!(
        "usage: hlslc [-h] [-fs | -vs] [-hlsl [-legacy]] FILENAME ENTRYNAME\n\
         \n\
         Translate HLSL shader to GLSL shader.\n\
         \n\
         positional arguments:\n\
         \x20FILENAME    input file name\n\
         \x20ENTRYNAME   entry point of the shader\n\
         \n\
         optional arguments:\n\
         \x20-h, --help  show this help message and exit\n\
         \x20-fs         generate fragment shader (default)\n\
         \x20-vs         generate vertex shader\n\
         \x20-hlsl       pretty-print HLSL instead of translating to GLSL\n\
         \x20-legacy     with -hlsl, target the D3D9 dialect"
    );
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let mut file_name: Option<String> = None;
    let mut entry_name: Option<String> = None;
    let mut target = Target::Fragment;
    let mut language = OutputLanguage::Glsl;
    let mut legacy = false;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                return ExitCode::SUCCESS;
            }
            "-fs" => target = Target::Fragment,
            "-vs" => target = Target::Vertex,
            "-hlsl" => language = OutputLanguage::Hlsl,
            "-legacy" => legacy = true,
            _ if file_name.is_none() => file_name = Some(arg),
            _ if entry_name.is_none() => entry_name = Some(arg),
            _ => {
                eprintln!("ERROR: Too many arguments");
                print_usage();
                return ExitCode::FAILURE;
            }
        }
    }

    let (Some(file_name), Some(entry_name)) = (file_name, entry_name) else {
        eprintln!("ERROR: Missing arguments");
        print_usage();
        return ExitCode::FAILURE;
    };

    let source = match std::fs::read_to_string(&file_name) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("ERROR: Unable to read '{file_name}': {error}");
            return ExitCode::FAILURE;
        }
    };

    let result = match language {
        OutputLanguage::Glsl => hlslc::translate_glsl(&source, &file_name, target, &entry_name),
        OutputLanguage::Hlsl => hlslc::print_hlsl(&source, &file_name, legacy),
    };

    match result {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("ERROR: {error}");
            ExitCode::FAILURE
        }
    }
}
