use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use log::info;
use ndskel::SkeletonDocument;

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args_os().skip(1);
    let Some(path) = args.next().map(PathBuf::from) else {
        bail!("usage: ndskel <file.NDskl>");
    };

    let doc = SkeletonDocument::open(&path)
        .with_context(|| format!("loading {}", path.display()))?;
    let skel = doc.skeleton().context("document not loaded")?;

    info!("bbox origin {:?}, extent {:?}", skel.bbox.origin, skel.bbox.extent);
    info!(
        "critical point columns: {:?}",
        skel.critical_point_data.column_names()
    );
    info!("filament columns: {:?}", skel.filament_data.column_names());

    println!("{}", skel.to_json().context("encoding JSON")?);
    Ok(())
}
