use sycorax::ChunkRegistry;

use anyhow::Result;
use log::*;

fn main() -> Result<()> {
    std::env::set_var("RUST_LOG", "debug");
    pretty_env_logger::init();

    // One registry owns every chunk, so the final clear_all tears
    // everything down in a single call.
    let mut registry = ChunkRegistry::new();
    let id = registry.init("joyc", 1024 * 1024)?;

    for summary in registry.dump_all() {
        println!("{}", summary);
    }

    // Ask the chunk for a small named block, and write a greeting
    // into it. The slice length is the byte count written.
    let chunk = registry.chunk_mut(id).expect("chunk was just registered");
    let handle = chunk.alloc(10, "greeting")?;
    for record in chunk.blocks() {
        println!("  {}", record);
    }

    chunk.write(handle, b"HI0099")?;
    let data = chunk.read(handle, 6)?;
    println!("read back: {}", String::from_utf8_lossy(data));

    // Freeing by name folds the block back into free space and
    // merges it with its free neighbor.
    chunk.free("greeting")?;
    for summary in registry.dump_all() {
        println!("{}", summary);
    }

    registry.clear_all();
    info!("Tore down every chunk.");

    Ok(())
}
