// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the bundled WGSL shaders

use friedcamera::constants::shaders as names;
use friedcamera::shaders::ShaderSources;
use std::path::Path;

fn bundled() -> ShaderSources {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join(names::DEFAULT_DIRECTORY);
    ShaderSources::load(&dir).expect("bundled shaders present")
}

/// Validate that a WGSL shader compiles successfully using naga
fn validate_shader(name: &str, source: &str) -> naga::Module {
    let module = match naga::front::wgsl::parse_str(source) {
        Ok(module) => module,
        Err(e) => panic!("Shader '{}' parse failed: {:?}", name, e),
    };
    if let Err(e) = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    {
        panic!("Shader '{}' validation failed: {:?}", name, e);
    }
    module
}

fn entry_point<'a>(module: &'a naga::Module, name: &str) -> &'a naga::EntryPoint {
    module
        .entry_points
        .iter()
        .find(|ep| ep.name == name)
        .unwrap_or_else(|| panic!("entry point '{}' missing", name))
}

#[test]
fn test_vertex_shader_validates() {
    let module = validate_shader(names::VERTEX_FILE, &bundled().vertex);
    assert_eq!(
        entry_point(&module, names::VERTEX_ENTRY).stage,
        naga::ShaderStage::Vertex
    );
}

#[test]
fn test_fragment_shader_validates() {
    let module = validate_shader(names::FRAGMENT_FILE, &bundled().fragment);
    assert_eq!(
        entry_point(&module, names::FRAGMENT_ENTRY).stage,
        naga::ShaderStage::Fragment
    );
}

#[test]
fn test_compute_shader_validates() {
    let module = validate_shader(names::COMPUTE_FILE, &bundled().compute);
    let ep = entry_point(&module, names::COMPUTE_ENTRY);
    assert_eq!(ep.stage, naga::ShaderStage::Compute);

    // One workgroup thread per 2x2 pixel quad of a tile
    let [x, y, z] = ep.workgroup_size;
    assert_eq!((x * 2, y * 2, z), (names::TILE_SIZE, names::TILE_SIZE, 1));
}

#[test]
fn test_compute_uniform_matches_frame_params() {
    let module = validate_shader(names::COMPUTE_FILE, &bundled().compute);
    let mut layouter = naga::proc::Layouter::default();
    layouter
        .update(module.to_ctx())
        .expect("layout computable");

    let (_, uniform) = module
        .global_variables
        .iter()
        .find(|(_, var)| var.space == naga::AddressSpace::Uniform)
        .expect("uniform block present");
    assert_eq!(
        layouter[uniform.ty].size as u64,
        friedcamera::shaders::FrameParams::SIZE
    );
}
