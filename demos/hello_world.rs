use anyhow::Context;
use fsops_kit::{EnumerationResult, Filesystem, GlobOptions};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // RUST_LOG=fsops_kit=debug shows the idempotence decisions.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let fs = Filesystem::native();
    let root = std::env::temp_dir().join("fsops_hello");
    println!("Backend: {}, root: {}", fs.backend().name(), root.display());

    // creates `<tmp>/fsops_hello/docs` and every missing parent
    fs.create_directory_all(root.join("docs"))?;

    // creating it again is not an error
    fs.create_directory(root.join("docs"))?;

    std::fs::write(root.join("docs/first.txt"), b"Hello")?;
    std::fs::write(root.join("second.txt"), b"World")?;

    let info = fs.path_info(root.join("docs/first.txt"))?;
    println!("first.txt: {:?}, {} bytes", info.path_type, info.size);

    fs.enumerate(&root, |dir, name| {
        println!("{} contains {}", dir.display(), name.to_string_lossy());
        EnumerationResult::Continue
    })?;

    let texts = fs.glob_directory(&root, Some("**/*.txt"), GlobOptions::default())?;
    println!("text files: {texts:?}");

    fs.rename(root.join("second.txt"), root.join("docs/second.txt"))
        .context("moving second.txt")?;

    // removes files and directories bottom-up; the second removal of a
    // path that is already gone still succeeds
    for path in ["docs/first.txt", "docs/second.txt", "docs", "docs", ""] {
        fs.remove(root.join(path))?;
    }

    Ok(())
}
