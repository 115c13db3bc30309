//! Splices the variation chunks into a [`ShaderSource`].

use std::fmt::Write;
use std::ops::Range;

use crate::material::ShaderSource;
use crate::variation::USE_MATVAR;

use super::chunks;
use super::{InjectionPoint, InjectionReport, InjectionStatus, Placement, ShaderStage, Splice};

/// Appended to both stages once injected.
pub const INJECTION_MARKER: &str = "// MATVAR_INJECTED";

/// Samplers whose template lookups are routed through `mvTexture`, with their UV varyings.
const TEXTURE_CALL_SITES: &[(&str, &str)] = &[
    ("map", "vMapUv"),
    ("roughnessMap", "vRoughnessMapUv"),
    ("metalnessMap", "vMetalnessMapUv"),
    ("normalMap", "vNormalMapUv"),
    ("aoMap", "vAoMapUv"),
    ("emissiveMap", "vEmissiveMapUv"),
];

/// Splices for every injection point, in application order.
pub fn material_variation_splices() -> Vec<Splice> {
    InjectionPoint::ALL
        .into_iter()
        .map(|point| {
            let code = match point {
                InjectionPoint::VertexPrelude => chunks::vertex_prelude(),
                InjectionPoint::VertexNormal => chunks::VERTEX_NORMAL.to_string(),
                InjectionPoint::VertexWorldPosition => chunks::VERTEX_WORLDPOS.to_string(),
                InjectionPoint::FragmentPrelude => chunks::fragment_prelude(),
                InjectionPoint::DiffuseMap => chunks::MAP_FRAGMENT.to_string(),
                InjectionPoint::RoughnessMap => chunks::roughness_and_composite(),
                InjectionPoint::MetalnessMap => chunks::METALNESSMAP_FRAGMENT.to_string(),
                InjectionPoint::NormalMaps => chunks::NORMAL_FRAGMENT_MAPS.to_string(),
            };
            Splice { point, code }
        })
        .collect()
}

/// Inject the variation code into `source` in place.
///
/// Does nothing unless `USE_MATVAR` is defined, and nothing on source that was
/// already injected. A missing anchor skips that splice with a warning; the
/// remaining splices are still applied.
pub fn inject_material_variation(source: &mut ShaderSource) -> InjectionReport {
    if !source.defines.contains_key(USE_MATVAR) {
        return InjectionReport::skipped(InjectionStatus::NotRequested);
    }
    if source.vertex_shader.contains(INJECTION_MARKER) || source.fragment_shader.contains(INJECTION_MARKER) {
        log::debug!("{}: variation already injected", source.name);
        return InjectionReport::skipped(InjectionStatus::AlreadyInjected);
    }

    let mut report = InjectionReport::skipped(InjectionStatus::Injected);
    for splice in material_variation_splices() {
        let text = match splice.point.stage() {
            ShaderStage::Vertex => &mut source.vertex_shader,
            ShaderStage::Fragment => &mut source.fragment_shader,
        };
        if apply_splice(text, &splice) {
            report.applied.push(splice.point);
        } else {
            log::warn!("{}: injection anchor {} not found", source.name, splice.point);
            report.missing.push(splice.point);
        }
    }

    let (fragment, rewritten) = rewrite_texture_calls(&source.fragment_shader);
    source.fragment_shader = fragment;
    report.rewritten_call_sites = rewritten;

    for text in [&mut source.vertex_shader, &mut source.fragment_shader] {
        if !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(INJECTION_MARKER);
        text.push('\n');
    }

    log::debug!(
        "{}: injected {} splices, {} missing, {} texture call sites rewritten",
        source.name,
        report.applied.len(),
        report.missing.len(),
        report.rewritten_call_sites
    );
    report
}

fn apply_splice(text: &mut String, splice: &Splice) -> bool {
    let Some(anchor) = find_include(text, splice.point.anchor()) else {
        return false;
    };
    let code = splice.code.trim_end();
    match splice.point.placement() {
        Placement::Before => text.insert_str(anchor.start, &format!("{code}\n")),
        Placement::After => text.insert_str(anchor.end, &format!("\n{code}")),
        Placement::Replace => text.replace_range(anchor, code),
    }
    true
}

/// Byte range of the first `#include <chunk>` directive, tolerant of spacing.
pub(crate) fn find_include(src: &str, chunk: &str) -> Option<Range<usize>> {
    let mut offset = 0;
    for line in src.split_inclusive('\n') {
        let body = line.trim_end();
        let directive = body.trim_start();
        if is_include_of(directive, chunk) {
            let start = offset + (body.len() - directive.len());
            return Some(start..start + directive.len());
        }
        offset += line.len();
    }
    None
}

fn is_include_of(directive: &str, chunk: &str) -> bool {
    let Some(rest) = directive.strip_prefix('#') else {
        return false;
    };
    let Some(rest) = rest.trim_start().strip_prefix("include") else {
        return false;
    };
    let Some(rest) = rest.trim_start().strip_prefix('<') else {
        return false;
    };
    let Some(name) = rest.strip_suffix('>') else {
        return false;
    };
    name.trim() == chunk
}

/// Route `texture2D( sampler, uv )` for the known samplers through `mvTexture`.
fn rewrite_texture_calls(src: &str) -> (String, usize) {
    const CALL: &str = "texture2D";

    let mut out = String::with_capacity(src.len() + 64);
    let mut count = 0;
    let mut rest = src;
    while let Some(at) = rest.find(CALL) {
        let (head, tail) = rest.split_at(at);
        out.push_str(head);
        let after = &tail[CALL.len()..];

        let at_boundary = !head.ends_with(|c: char| c.is_ascii_alphanumeric() || c == '_');
        let call = if at_boundary { parse_call(after) } else { None };
        match call {
            Some((sampler, uv, consumed)) if TEXTURE_CALL_SITES.iter().any(|&(s, v)| s == sampler && v == uv) => {
                let _ = write!(out, "mvTexture( {sampler}, {uv} )");
                count += 1;
                rest = &after[consumed..];
            }
            _ => {
                out.push_str(CALL);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    (out, count)
}

/// Parse `( ident , ident )` at the start of `s`; returns both idents and bytes consumed.
fn parse_call(s: &str) -> Option<(&str, &str, usize)> {
    let bytes = s.as_bytes();
    let mut i = skip_ws(bytes, 0);
    if bytes.get(i) != Some(&b'(') {
        return None;
    }
    i = skip_ws(bytes, i + 1);
    let (sampler, end) = ident(s, i)?;
    i = skip_ws(bytes, end);
    if bytes.get(i) != Some(&b',') {
        return None;
    }
    i = skip_ws(bytes, i + 1);
    let (uv, end) = ident(s, i)?;
    i = skip_ws(bytes, end);
    if bytes.get(i) != Some(&b')') {
        return None;
    }
    Some((sampler, uv, i + 1))
}

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
        i += 1;
    }
    i
}

fn ident(s: &str, start: usize) -> Option<(&str, usize)> {
    let end = s[start..]
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .map_or(s.len(), |n| start + n);
    (end > start).then(|| (&s[start..end], end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::template::ShaderTemplate;
    use std::collections::BTreeMap;

    fn source_with(vertex: &str, fragment: &str, matvar: bool) -> ShaderSource {
        let mut defines = BTreeMap::new();
        if matvar {
            defines.insert(USE_MATVAR.to_string(), String::new());
        }
        ShaderSource::new("test", vertex, fragment, defines)
    }

    fn standard(matvar: bool) -> ShaderSource {
        let t = ShaderTemplate::standard();
        source_with(&t.vertex_shader, &t.fragment_shader, matvar)
    }

    #[test]
    fn test_find_include_tolerates_spacing() {
        let src = "a\n\t#  include   < map_fragment >  \nb";
        let range = find_include(src, "map_fragment").unwrap();
        assert_eq!(&src[range], "#  include   < map_fragment >");
        assert!(find_include(src, "map").is_none());
        assert!(find_include("// #include <map_fragment>", "map_fragment").is_none());
    }

    #[test]
    fn test_standard_template_fully_injected() {
        let mut src = standard(true);
        let report = inject_material_variation(&mut src);
        assert_eq!(report.status, InjectionStatus::Injected);
        assert!(report.is_complete(), "missing {:?}", report.missing);
        assert_eq!(report.applied.len(), InjectionPoint::ALL.len());
        // aoMap and emissiveMap lookups live in the template body.
        assert_eq!(report.rewritten_call_sites, 2);

        assert!(!src.fragment_shader.contains("#include <map_fragment>"));
        assert!(!src.fragment_shader.contains("#include <roughnessmap_fragment>"));
        assert!(src.fragment_shader.contains("#include <common>"));
        assert!(src.fragment_shader.contains("mvTexture( emissiveMap, vEmissiveMapUv )"));
        assert!(!src.fragment_shader.contains("texture2D( aoMap, vAoMapUv )"));
        assert!(src.vertex_shader.contains("vMatVarWorldPos = "));
        assert!(src.vertex_shader.contains(INJECTION_MARKER));
    }

    #[test]
    fn test_prelude_follows_common() {
        let mut src = standard(true);
        inject_material_variation(&mut src);
        let common = src.fragment_shader.find("#include <common>").unwrap();
        let helpers = src.fragment_shader.find("float mvNoise(").unwrap();
        let main = src.fragment_shader.find("void main()").unwrap();
        assert!(common < helpers && helpers < main);
    }

    #[test]
    fn test_composite_after_diffuse_before_normals() {
        let mut src = standard(true);
        inject_material_variation(&mut src);
        let f = &src.fragment_shader;
        let diffuse = f.find("mvTexture( map, vMapUv )").unwrap();
        let cavity = f.find("// cavity").unwrap();
        let cracks = f.find("// cracks").unwrap();
        let normals = f.find("normalScale * mvNormalFactor").unwrap();
        assert!(diffuse < cavity && cavity < cracks && cracks < normals);
    }

    #[test]
    fn test_without_define_is_noop() {
        let mut src = standard(false);
        let before = src.clone();
        let report = inject_material_variation(&mut src);
        assert_eq!(report.status, InjectionStatus::NotRequested);
        assert_eq!(src.vertex_shader, before.vertex_shader);
        assert_eq!(src.fragment_shader, before.fragment_shader);
    }

    #[test]
    fn test_second_injection_skipped() {
        let mut src = standard(true);
        inject_material_variation(&mut src);
        let once = src.fragment_shader.clone();
        let report = inject_material_variation(&mut src);
        assert_eq!(report.status, InjectionStatus::AlreadyInjected);
        assert_eq!(src.fragment_shader, once);
        assert_eq!(once.matches("void mvApplyLayer(").count(), 1);
    }

    #[test]
    fn test_missing_anchors_reported() {
        let mut src = source_with(
            "#include <common>\nvoid main() {\n}\n",
            "#include <common>\nvoid main() {\n#include <map_fragment>\n}\n",
            true,
        );
        let report = inject_material_variation(&mut src);
        assert_eq!(report.status, InjectionStatus::Injected);
        assert!(report.applied.contains(&InjectionPoint::DiffuseMap));
        assert!(report.missing.contains(&InjectionPoint::NormalMaps));
        assert!(report.missing.contains(&InjectionPoint::VertexWorldPosition));
        assert!(!report.is_complete());
        assert!(matches!(report.into_result(), Err(crate::core::Error::MissingAnchors(_))));
    }

    #[test]
    fn test_rewrite_texture_calls() {
        let src = "a = texture2D(map,vMapUv); b = texture2D( foo, vMapUv ); c = mytexture2D( map, vMapUv );\n\
                   d = texture2D(\n\taoMap ,  vAoMapUv\n).r;";
        let (out, count) = rewrite_texture_calls(src);
        assert_eq!(count, 2);
        assert!(out.contains("a = mvTexture( map, vMapUv );"));
        assert!(out.contains("b = texture2D( foo, vMapUv );"));
        assert!(out.contains("c = mytexture2D( map, vMapUv );"));
        assert!(out.contains("d = mvTexture( aoMap, vAoMapUv ).r;"));
    }

    #[test]
    fn test_injection_does_not_touch_uniform_table() {
        let mut src = standard(true);
        inject_material_variation(&mut src);
        assert!(src.uniforms.borrow().is_empty());
    }
}
