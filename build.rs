// in build.rs
use clap_complete::{
    generate_to,
    shells::{Bash, Zsh},
};
use std::env;
use std::io;

include!("src/cli.rs");

fn main() -> Result<(), io::Error> {
    let outdir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    };
    println!("cargo:rerun-if-changed=src/cli.rs");

    let mut cmd = make_cli_app();
    for bin in ["seqlab", "sl"] {
        generate_to(Bash, &mut cmd, bin, &outdir)?;
        generate_to(Zsh, &mut cmd, bin, &outdir)?;
    }
    Ok(())
}
