//! Versioned WGSL assets and their uniform-layout check.
//!
//! Each shader file starts with `// shader-version: N` and declares one uniform struct whose
//! layout must match a `#[repr(C)]` Rust struct. [`ShaderAsset::validate`] catches drift between
//! the two before any pipeline is created.

use sdf_shading::{PlaneUniforms, ShaderUniformSet};

const VERSION_PREFIX: &str = "// shader-version:";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShaderAssetError {
    #[error("shader '{name}' has no '// shader-version: N' header")]
    MissingVersion { name: &'static str },

    #[error("shader '{name}' is version {found}, expected {expected}")]
    VersionMismatch {
        name: &'static str,
        expected: u32,
        found: u32,
    },

    #[error("shader '{name}' does not declare struct {struct_name}")]
    MissingStruct {
        name: &'static str,
        struct_name: &'static str,
    },

    #[error("struct {struct_name} has {found} fields, expected {expected}")]
    FieldCount {
        struct_name: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("struct {struct_name} field {index}: expected `{expected}`, found `{found}`")]
    FieldMismatch {
        struct_name: &'static str,
        index: usize,
        expected: String,
        found: String,
    },

    #[error("struct {struct_name} is {wgsl_size} bytes in WGSL but {host_size} bytes on the host")]
    SizeMismatch {
        struct_name: &'static str,
        wgsl_size: usize,
        host_size: usize,
    },
}

/// WGSL types allowed in a uniform descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformType {
    F32,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Vec4Array(usize),
}

impl UniformType {
    /// WGSL spelling with whitespace removed.
    pub fn wgsl_name(self) -> String {
        match self {
            UniformType::F32 => "f32".into(),
            UniformType::Vec2 => "vec2<f32>".into(),
            UniformType::Vec3 => "vec3<f32>".into(),
            UniformType::Vec4 => "vec4<f32>".into(),
            UniformType::Mat4 => "mat4x4<f32>".into(),
            UniformType::Vec4Array(n) => format!("array<vec4<f32>,{n}>"),
        }
    }

    /// Uniform address space alignment.
    pub fn align(self) -> usize {
        match self {
            UniformType::F32 => 4,
            UniformType::Vec2 => 8,
            UniformType::Vec3 | UniformType::Vec4 | UniformType::Mat4 | UniformType::Vec4Array(_) => 16,
        }
    }

    pub fn size(self) -> usize {
        match self {
            UniformType::F32 => 4,
            UniformType::Vec2 => 8,
            UniformType::Vec3 => 12,
            UniformType::Vec4 => 16,
            UniformType::Mat4 => 64,
            UniformType::Vec4Array(n) => 16 * n,
        }
    }
}

/// Expected layout of a WGSL uniform struct and the size of its host-side twin.
#[derive(Clone, Copy, Debug)]
pub struct UniformBindingDescriptor {
    pub struct_name: &'static str,
    pub fields: &'static [(&'static str, UniformType)],
    pub host_size: usize,
}

impl UniformBindingDescriptor {
    /// Struct size under WGSL uniform layout rules.
    pub fn wgsl_size(&self) -> usize {
        let mut offset = 0;
        let mut max_align = 1;
        for &(_, ty) in self.fields {
            offset = round_up(offset, ty.align()) + ty.size();
            max_align = max_align.max(ty.align());
        }
        round_up(offset, max_align)
    }
}

fn round_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

#[derive(Clone, Copy, Debug)]
pub struct ShaderAsset {
    pub name: &'static str,
    pub expected_version: u32,
    pub source: &'static str,
    pub uniforms: UniformBindingDescriptor,
}

impl ShaderAsset {
    pub fn version(&self) -> Option<u32> {
        self.source
            .lines()
            .next()?
            .trim()
            .strip_prefix(VERSION_PREFIX)?
            .trim()
            .parse()
            .ok()
    }

    pub fn validate(&self) -> Result<(), ShaderAssetError> {
        let found = self
            .version()
            .ok_or(ShaderAssetError::MissingVersion { name: self.name })?;
        if found != self.expected_version {
            return Err(ShaderAssetError::VersionMismatch {
                name: self.name,
                expected: self.expected_version,
                found,
            });
        }

        let descriptor = &self.uniforms;
        let fields = parse_struct_fields(self.source, descriptor.struct_name).ok_or(
            ShaderAssetError::MissingStruct {
                name: self.name,
                struct_name: descriptor.struct_name,
            },
        )?;

        if fields.len() != descriptor.fields.len() {
            return Err(ShaderAssetError::FieldCount {
                struct_name: descriptor.struct_name,
                expected: descriptor.fields.len(),
                found: fields.len(),
            });
        }

        for (index, ((name, ty), (expected_name, expected_ty))) in
            fields.iter().zip(descriptor.fields).enumerate()
        {
            let expected_ty = expected_ty.wgsl_name();
            if name.as_str() != *expected_name || *ty != expected_ty {
                return Err(ShaderAssetError::FieldMismatch {
                    struct_name: descriptor.struct_name,
                    index,
                    expected: format!("{expected_name}: {expected_ty}"),
                    found: format!("{name}: {ty}"),
                });
            }
        }

        let wgsl_size = descriptor.wgsl_size();
        if wgsl_size != descriptor.host_size {
            return Err(ShaderAssetError::SizeMismatch {
                struct_name: descriptor.struct_name,
                wgsl_size,
                host_size: descriptor.host_size,
            });
        }

        log::debug!("Shader '{}' v{} validated", self.name, found);
        Ok(())
    }
}

/// `(name, type)` pairs of `struct <struct_name> { ... }`, one field per line, types with
/// whitespace stripped. `None` if the struct is absent.
fn parse_struct_fields(source: &str, struct_name: &str) -> Option<Vec<(String, String)>> {
    let header = format!("struct {struct_name}");
    let start = source.lines().position(|line| {
        line.trim()
            .strip_prefix(&header)
            .is_some_and(|rest| rest.trim_start().starts_with('{') || rest.trim().is_empty())
    })?;

    let mut fields = Vec::new();
    for line in source.lines().skip(start + 1) {
        let line = match line.find("//") {
            Some(comment) => &line[..comment],
            None => line,
        };
        let line = line.trim();
        if line.starts_with('}') {
            return Some(fields);
        }
        if line.is_empty() || line == "{" {
            continue;
        }

        let (name, ty) = line.split_once(':')?;
        let ty: String = ty
            .trim()
            .trim_end_matches(',')
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        fields.push((name.trim().to_string(), ty));
    }

    None
}

pub const MSDF_TEXT_SHADER: ShaderAsset = ShaderAsset {
    name: "msdf_text",
    expected_version: 1,
    source: include_str!("shaders/msdf_text.wgsl"),
    uniforms: UniformBindingDescriptor {
        struct_name: "TextUniforms",
        fields: &[
            ("color", UniformType::Vec4),
            ("stroke_color", UniformType::Vec4),
            ("reveal_colors", UniformType::Vec4Array(2)),
            ("progress", UniformType::Vec4),
            ("time", UniformType::F32),
            ("opacity", UniformType::F32),
            ("threshold", UniformType::F32),
            ("alpha_test", UniformType::F32),
            ("stroke_outset_width", UniformType::F32),
            ("stroke_inset_width", UniformType::F32),
            ("reveal_softness", UniformType::F32),
            ("noise_scale", UniformType::F32),
        ],
        host_size: std::mem::size_of::<ShaderUniformSet>(),
    },
};

pub const NOISE_PLANE_SHADER: ShaderAsset = ShaderAsset {
    name: "noise_plane",
    expected_version: 1,
    source: include_str!("shaders/noise_plane.wgsl"),
    uniforms: UniformBindingDescriptor {
        struct_name: "PlaneUniforms",
        fields: &[
            ("time", UniformType::F32),
            ("progress", UniformType::F32),
            ("_padding", UniformType::Vec2),
        ],
        host_size: std::mem::size_of::<PlaneUniforms>(),
    },
};

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_FIELDS: &[(&str, UniformType)] =
        &[("tint", UniformType::Vec4), ("time", UniformType::F32)];

    fn asset(source: &'static str, host_size: usize) -> ShaderAsset {
        ShaderAsset {
            name: "test",
            expected_version: 2,
            source,
            uniforms: UniformBindingDescriptor {
                struct_name: "Params",
                fields: SMALL_FIELDS,
                host_size,
            },
        }
    }

    #[test]
    fn test_bundled_shaders_validate() {
        MSDF_TEXT_SHADER.validate().unwrap();
        NOISE_PLANE_SHADER.validate().unwrap();
    }

    #[test]
    fn test_wgsl_size_rounds_to_struct_alignment() {
        let descriptor = UniformBindingDescriptor {
            struct_name: "Params",
            fields: SMALL_FIELDS,
            host_size: 0,
        };
        // vec4 (16) + f32 (4), rounded up to 16
        assert_eq!(descriptor.wgsl_size(), 32);
        assert_eq!(MSDF_TEXT_SHADER.uniforms.wgsl_size(), 112);
    }

    #[test]
    fn test_valid_asset() {
        let source = "// shader-version: 2\nstruct Params {\n    tint: vec4<f32>,\n    time: f32, // seconds\n}\n";
        assert_eq!(asset(source, 32).validate(), Ok(()));
    }

    #[test]
    fn test_missing_version() {
        let source = "struct Params {\n    tint: vec4<f32>,\n    time: f32,\n}\n";
        assert_eq!(
            asset(source, 32).validate(),
            Err(ShaderAssetError::MissingVersion { name: "test" })
        );
    }

    #[test]
    fn test_version_mismatch() {
        let source = "// shader-version: 1\nstruct Params {\n    tint: vec4<f32>,\n    time: f32,\n}\n";
        assert!(matches!(
            asset(source, 32).validate(),
            Err(ShaderAssetError::VersionMismatch { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn test_missing_struct() {
        let source = "// shader-version: 2\nstruct Other {\n    tint: vec4<f32>,\n}\n";
        assert!(matches!(
            asset(source, 32).validate(),
            Err(ShaderAssetError::MissingStruct { .. })
        ));
    }

    #[test]
    fn test_field_order_matters() {
        let source = "// shader-version: 2\nstruct Params {\n    time: f32,\n    tint: vec4<f32>,\n}\n";
        assert!(matches!(
            asset(source, 32).validate(),
            Err(ShaderAssetError::FieldMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn test_field_count() {
        let source = "// shader-version: 2\nstruct Params {\n    tint: vec4<f32>,\n}\n";
        assert!(matches!(
            asset(source, 32).validate(),
            Err(ShaderAssetError::FieldCount { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn test_host_size_mismatch() {
        let source = "// shader-version: 2\nstruct Params {\n    tint: vec4<f32>,\n    time: f32,\n}\n";
        assert!(matches!(
            asset(source, 20).validate(),
            Err(ShaderAssetError::SizeMismatch { wgsl_size: 32, host_size: 20, .. })
        ));
    }

    #[test]
    fn test_array_type_whitespace_is_ignored() {
        let fields = parse_struct_fields(
            "struct A {\n    colors: array<vec4<f32>, 2>,\n}\n",
            "A",
        )
        .unwrap();
        assert_eq!(fields, vec![("colors".to_string(), UniformType::Vec4Array(2).wgsl_name())]);
    }
}
