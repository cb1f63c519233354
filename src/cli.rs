// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands

use friedcamera::backends::camera::enumerate_cameras;

/// List all available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    gstreamer::init()?;

    let cameras = enumerate_cameras()?;

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        if let Some(caps) = &camera.caps {
            println!("      {}", caps);
        }
    }

    Ok(())
}
