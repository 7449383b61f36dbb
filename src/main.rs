use std::fs::File;
use std::io::{self, Read};
use std::process;

use clap::{App, Arg};

use bfjit::{optimize, parse, Backend, BACKENDS, DEFAULT_BACKEND};

struct Options {
    input: String,
    dump_ir: bool,
    no_optimize: bool,
    backend: &'static dyn Backend,
}

impl Options {
    fn match_options() -> Self {
        let matches = App::new("bfjit")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Brainfuck interpreter and x86_64 JIT")
            .arg(
                Arg::with_name("dump_ir")
                    .long("dump-ir")
                    .help("Dump instruction tree instead of running; for debugging"),
            )
            .arg(
                Arg::with_name("no_optimize")
                    .long("no-optimize")
                    .help("Skip run-length folding; for debugging"),
            )
            .arg(
                Arg::with_name("backend")
                    .long("backend")
                    .help("Execution backend")
                    .takes_value(true)
                    .possible_values(&BACKENDS.keys().cloned().collect::<Vec<&str>>())
                    .default_value(DEFAULT_BACKEND),
            )
            .arg(
                Arg::with_name("FILENAME")
                    .help("Source file to run, or - for standard input")
                    .required(true)
                    .index(1),
            )
            .get_matches();

        Options {
            input: matches.value_of("FILENAME").unwrap().to_string(),
            dump_ir: matches.is_present("dump_ir"),
            no_optimize: matches.is_present("no_optimize"),
            backend: *BACKENDS.get(matches.value_of("backend").unwrap()).unwrap(),
        }
    }
}

fn read_source(path: &str) -> io::Result<Vec<u8>> {
    let mut code = Vec::new();
    if path == "-" {
        io::stdin().read_to_end(&mut code)?;
    } else {
        File::open(path)?.read_to_end(&mut code)?;
    }
    Ok(code)
}

fn main() {
    let options = Options::match_options();

    let code = read_source(&options.input).unwrap_or_else(|err| {
        eprintln!("bfjit: {}: {}", options.input, err);
        process::exit(1);
    });

    let program = parse(&code).unwrap_or_else(|err| {
        eprintln!("bfjit: parse error: {}", err);
        process::exit(1);
    });

    let program = if options.no_optimize {
        program
    } else {
        optimize(&program)
    };

    if options.dump_ir {
        println!("{:#?}", program);
        return;
    }

    if let Err(err) = options.backend.run(&program) {
        eprintln!("bfjit: {}", err);
        process::exit(1);
    }
}
