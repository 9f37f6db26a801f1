//! Color space resolution and conversion to device RGB.
//!
//! Resolves every PDF color space family from names, arrays and indirect
//! references into an immutable [`ColorSpace`], shared via `Arc` between
//! saved graphics states.
//!
//! Component order: the operand-stack entry point
//! ([`ColorSpace::rgb_from_stack`]) reads components last-operand-first for
//! every family except DeviceN, which reads them in natural order. Tint
//! transforms reverse their outputs before handing them to the alternate
//! space's stack entry point. [`ColorSpace::to_rgb`] takes natural order.

use std::collections::HashMap;
use std::sync::Arc;

use lopdf::{Dictionary, Document, Object, ObjectId};
use pdfshapes_core::{Rgb, clamp_unit};

use crate::function::PdfFunction;
use crate::objects::{decode_stream, dict_number, dict_numbers, resolve_ref};

/// Nesting limit for color spaces built from other color spaces.
const MAX_COLOR_SPACE_DEPTH: usize = 16;

/// D65 white point, the reference white of sRGB.
const D65: [f32; 3] = [0.9505, 1.0, 1.089];

/// A resolved PDF color space.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSpace {
    DeviceGray,
    DeviceRgb,
    DeviceCmyk,
    CalGray {
        white_point: [f32; 3],
        gamma: f32,
    },
    CalRgb {
        white_point: [f32; 3],
        gamma: [f32; 3],
        /// Column-major `[XA YA ZA XB YB ZB XC YC ZC]`.
        matrix: [f32; 9],
    },
    Lab {
        white_point: [f32; 3],
        /// `[amin amax bmin bmax]`.
        range: [f32; 4],
    },
    /// ICC profiles are not evaluated; conversion goes through the alternate.
    IccBased {
        components: usize,
        alternate: Arc<ColorSpace>,
    },
    Indexed {
        base: Arc<ColorSpace>,
        hival: usize,
        lookup: Vec<u8>,
    },
    Separation {
        name: String,
        alternate: Arc<ColorSpace>,
        tint: Option<Arc<PdfFunction>>,
    },
    DeviceN {
        names: Vec<String>,
        alternate: Arc<ColorSpace>,
        tint: Option<Arc<PdfFunction>>,
    },
    /// Pattern space with an optional underlying space for uncolored
    /// tiling patterns.
    Pattern(Option<Arc<ColorSpace>>),
}

/// Reverse component order.
pub fn reverse(components: &[f32]) -> Vec<f32> {
    components.iter().rev().copied().collect()
}

impl ColorSpace {
    /// Number of color components `sc`/`scn` expect (before a pattern name).
    pub fn component_count(&self) -> usize {
        match self {
            ColorSpace::DeviceGray | ColorSpace::CalGray { .. } => 1,
            ColorSpace::DeviceRgb | ColorSpace::CalRgb { .. } | ColorSpace::Lab { .. } => 3,
            ColorSpace::DeviceCmyk => 4,
            ColorSpace::IccBased { components, .. } => *components,
            ColorSpace::Indexed { .. } | ColorSpace::Separation { .. } => 1,
            ColorSpace::DeviceN { names, .. } => names.len(),
            ColorSpace::Pattern(underlying) => {
                underlying.as_ref().map_or(0, |u| u.component_count())
            }
        }
    }

    /// Components installed by `cs`/`CS`, in natural order.
    pub fn initial_components(&self) -> Vec<f32> {
        match self {
            ColorSpace::DeviceCmyk => vec![0.0, 0.0, 0.0, 1.0],
            ColorSpace::Lab { range, .. } => {
                vec![0.0, bounded(0.0, range[0], range[1]), bounded(0.0, range[2], range[3])]
            }
            ColorSpace::IccBased { alternate, .. } => alternate.initial_components(),
            ColorSpace::Separation { .. } | ColorSpace::DeviceN { .. } => {
                vec![1.0; self.component_count()]
            }
            _ => vec![0.0; self.component_count()],
        }
    }

    /// Whether this is a Pattern space.
    pub fn is_pattern(&self) -> bool {
        matches!(self, ColorSpace::Pattern(_))
    }

    /// Convert components given in natural order.
    pub fn to_rgb(&self, components: &[f32]) -> Rgb {
        match self {
            ColorSpace::DeviceN { .. } => self.rgb_from_stack(components),
            _ => self.rgb_from_stack(&reverse(components)),
        }
    }

    /// Convert components given in operand-stack order.
    pub fn rgb_from_stack(&self, stack: &[f32]) -> Rgb {
        match self {
            ColorSpace::DeviceN {
                names,
                alternate,
                tint,
            } => device_n_rgb(names, alternate, tint.as_deref(), stack),
            ColorSpace::IccBased { alternate, .. } => alternate.rgb_from_stack(stack),
            ColorSpace::Pattern(Some(underlying)) => underlying.rgb_from_stack(stack),
            _ => self.natural_rgb(&reverse(stack)),
        }
    }

    fn natural_rgb(&self, c: &[f32]) -> Rgb {
        let at = |i: usize| c.get(i).copied().unwrap_or(0.0);
        match self {
            ColorSpace::DeviceGray => {
                let g = at(0);
                Rgb::gray(if g > 1.0 { g / 255.0 } else { g })
            }
            ColorSpace::DeviceRgb => Rgb::new(at(0), at(1), at(2)),
            ColorSpace::DeviceCmyk => cmyk_to_rgb(at(0), at(1), at(2), at(3)),
            ColorSpace::CalGray { white_point, gamma } => {
                let a = clamp_unit(at(0)).powf(*gamma);
                xyz_to_rgb(
                    [white_point[0] * a, white_point[1] * a, white_point[2] * a],
                    white_point,
                )
            }
            ColorSpace::CalRgb {
                white_point,
                gamma,
                matrix,
            } => {
                let a = clamp_unit(at(0)).powf(gamma[0]);
                let b = clamp_unit(at(1)).powf(gamma[1]);
                let cc = clamp_unit(at(2)).powf(gamma[2]);
                let xyz = [
                    matrix[0] * a + matrix[3] * b + matrix[6] * cc,
                    matrix[1] * a + matrix[4] * b + matrix[7] * cc,
                    matrix[2] * a + matrix[5] * b + matrix[8] * cc,
                ];
                xyz_to_rgb(xyz, white_point)
            }
            ColorSpace::Lab { white_point, range } => {
                lab_to_rgb(at(0), at(1), at(2), white_point, range)
            }
            ColorSpace::Indexed {
                base,
                hival,
                lookup,
            } => {
                let index = (at(0).max(0.0) as usize).min(*hival);
                let n = base.component_count();
                let entry: Vec<f32> = (0..n)
                    .map(|i| {
                        lookup
                            .get(index * n + i)
                            .map_or(0.0, |&b| f32::from(b) / 255.0)
                    })
                    .collect();
                base.to_rgb(&entry)
            }
            ColorSpace::Separation {
                alternate, tint, ..
            } => match tint.as_deref() {
                Some(f) => tint_rgb(alternate, f, &[at(0)]),
                None => Rgb::gray(1.0 - at(0)),
            },
            // handled by rgb_from_stack
            ColorSpace::IccBased { alternate, .. } => alternate.to_rgb(c),
            ColorSpace::DeviceN { .. } => self.rgb_from_stack(c),
            ColorSpace::Pattern(Some(underlying)) => underlying.to_rgb(c),
            ColorSpace::Pattern(None) => Rgb::black(),
        }
    }
}

/// Evaluate a tint transform and convert the reversed outputs through the
/// alternate space.
fn tint_rgb(alternate: &ColorSpace, tint: &PdfFunction, input: &[f32]) -> Rgb {
    match tint.evaluate(input) {
        Some(out) => alternate.rgb_from_stack(&reverse(&out)),
        None => Rgb::black(),
    }
}

fn device_n_rgb(
    names: &[String],
    alternate: &ColorSpace,
    tint: Option<&PdfFunction>,
    components: &[f32],
) -> Rgb {
    if let Some(order) = cmyk_name_order(names) {
        let at = |i: usize| components.get(order[i]).copied().unwrap_or(0.0);
        return cmyk_to_rgb(at(0), at(1), at(2), at(3));
    }
    match tint {
        Some(f) => tint_rgb(alternate, f, components),
        None => Rgb::black(),
    }
}

/// For four colorants named by cyan/magenta/yellow/black initials (any case,
/// any order), the component index of each of c, m, y, k.
fn cmyk_name_order(names: &[String]) -> Option<[usize; 4]> {
    if names.len() != 4 {
        return None;
    }
    let mut order = [usize::MAX; 4];
    for (i, name) in names.iter().enumerate() {
        let slot = match name.chars().next()?.to_ascii_lowercase() {
            'c' => 0,
            'm' => 1,
            'y' => 2,
            'b' => 3,
            _ => return None,
        };
        if order[slot] != usize::MAX {
            return None;
        }
        order[slot] = i;
    }
    Some(order)
}

/// DeviceCMYK to RGB using a polynomial fitted to Acrobat's output.
pub fn cmyk_to_rgb(c: f32, m: f32, y: f32, k: f32) -> Rgb {
    let c = clamp_unit(c + k);
    let m = clamp_unit(m + k);
    let y = clamp_unit(y + k);

    let aw = (1.0 - c) * (1.0 - m) * (1.0 - y);
    let ac = c * (1.0 - m) * (1.0 - y);
    let am = (1.0 - c) * m * (1.0 - y);
    let ay = (1.0 - c) * (1.0 - m) * y;
    let ar = (1.0 - c) * m * y;
    let ag = c * (1.0 - m) * y;
    let ab = c * m * (1.0 - y);

    let r = aw + 0.9137 * am + 0.9961 * ay + 0.9882 * ar;
    let g = aw + 0.6196 * ac + ay + 0.5176 * ag;
    let b = aw + 0.7804 * ac + 0.5412 * am + 0.0667 * ar + 0.2118 * ag + 0.4863 * ab;
    Rgb::new(r, g, b)
}

/// CIE XYZ relative to `white_point` to sRGB.
fn xyz_to_rgb(xyz: [f32; 3], white_point: &[f32; 3]) -> Rgb {
    // von Kries scaling onto D65
    let adapt = |i: usize| {
        if white_point[i] > 0.0 {
            xyz[i] * D65[i] / white_point[i]
        } else {
            xyz[i]
        }
    };
    let (x, y, z) = (adapt(0), adapt(1), adapt(2));
    let r = 3.2406 * x - 1.5372 * y - 0.4986 * z;
    let g = -0.9689 * x + 1.8758 * y + 0.0415 * z;
    let b = 0.0557 * x - 0.2040 * y + 1.0570 * z;
    Rgb::new(srgb_gamma(r), srgb_gamma(g), srgb_gamma(b))
}

/// Clamp without panicking on an inverted range read from the file.
fn bounded(v: f32, lo: f32, hi: f32) -> f32 {
    v.max(lo).min(hi)
}

fn srgb_gamma(v: f32) -> f32 {
    let v = clamp_unit(v);
    if v <= 0.003_130_8 {
        12.92 * v
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

fn lab_to_rgb(l: f32, a: f32, b: f32, white_point: &[f32; 3], range: &[f32; 4]) -> Rgb {
    let l = l.clamp(0.0, 100.0);
    let a = bounded(a, range[0], range[1]);
    let b = bounded(b, range[2], range[3]);
    let m = (l + 16.0) / 116.0;
    let g = |x: f32| {
        if x >= 6.0 / 29.0 {
            x * x * x
        } else {
            108.0 / 841.0 * (x - 4.0 / 29.0)
        }
    };
    let xyz = [
        white_point[0] * g(m + a / 500.0),
        white_point[1] * g(m),
        white_point[2] * g(m - b / 200.0),
    ];
    xyz_to_rgb(xyz, white_point)
}

/// Per-interpretation cache of resolved color spaces.
///
/// Indirect color space objects (including ICC profile streams) are keyed by
/// object id, so every use of the same object shares one `Arc`.
#[derive(Debug, Default)]
pub struct ColorSpaceCache {
    by_id: HashMap<ObjectId, Arc<ColorSpace>>,
}

impl ColorSpaceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a color space operand (`cs`/`CS`): a device name, `Pattern`,
    /// or a `/Resources/ColorSpace` entry.
    ///
    /// Returns `None` when the specifier cannot be resolved; callers fall
    /// back to DeviceGray.
    pub fn resolve_name(
        &mut self,
        doc: &Document,
        resources: &Dictionary,
        name: &str,
    ) -> Option<Arc<ColorSpace>> {
        if let Some(cs) = device_space(name) {
            return Some(Arc::new(cs));
        }
        let group = resources
            .get(b"ColorSpace")
            .ok()
            .map(|o| resolve_ref(doc, o))
            .and_then(|o| o.as_dict().ok())?;
        let entry = group.get(name.as_bytes()).ok()?;
        self.resolve_object(doc, resources, entry, 0)
    }

    /// Resolve a color space object (name, array or reference).
    pub fn resolve(
        &mut self,
        doc: &Document,
        resources: &Dictionary,
        specifier: &Object,
    ) -> Option<Arc<ColorSpace>> {
        match resolve_ref(doc, specifier) {
            Object::Name(n) if !specifier_is_ref(specifier) => {
                self.resolve_name(doc, resources, &String::from_utf8_lossy(n))
            }
            _ => self.resolve_object(doc, resources, specifier, 0),
        }
    }

    fn resolve_object(
        &mut self,
        doc: &Document,
        resources: &Dictionary,
        obj: &Object,
        depth: usize,
    ) -> Option<Arc<ColorSpace>> {
        if depth > MAX_COLOR_SPACE_DEPTH {
            return None;
        }
        if let Object::Reference(id) = obj {
            if let Some(cs) = self.by_id.get(id) {
                return Some(Arc::clone(cs));
            }
            let target = doc.get_object(*id).ok()?;
            let cs = self.resolve_object(doc, resources, target, depth + 1)?;
            self.by_id.insert(*id, Arc::clone(&cs));
            return Some(cs);
        }

        match obj {
            Object::Name(n) => device_space(&String::from_utf8_lossy(n)).map(Arc::new),
            Object::Array(arr) => self.resolve_array(doc, resources, arr, depth),
            _ => None,
        }
    }

    fn resolve_array(
        &mut self,
        doc: &Document,
        resources: &Dictionary,
        arr: &[Object],
        depth: usize,
    ) -> Option<Arc<ColorSpace>> {
        let family = resolve_ref(doc, arr.first()?).as_name().ok()?;
        let family = String::from_utf8_lossy(family);
        let cs = match family.as_ref() {
            "ICCBased" => self.resolve_icc_based(doc, resources, arr, depth)?,
            "Indexed" | "I" => self.resolve_indexed(doc, resources, arr, depth)?,
            "Separation" => self.resolve_separation(doc, resources, arr, depth)?,
            "DeviceN" => self.resolve_device_n(doc, resources, arr, depth)?,
            "CalGray" => {
                let params = cal_params(doc, arr)?;
                ColorSpace::CalGray {
                    white_point: white_point(doc, params),
                    gamma: dict_number(doc, params, b"Gamma").unwrap_or(1.0) as f32,
                }
            }
            "CalRGB" => {
                let params = cal_params(doc, arr)?;
                let gamma = fixed::<3>(dict_numbers(doc, params, b"Gamma"), [1.0; 3]);
                let matrix = fixed::<9>(
                    dict_numbers(doc, params, b"Matrix"),
                    [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
                );
                ColorSpace::CalRgb {
                    white_point: white_point(doc, params),
                    gamma,
                    matrix,
                }
            }
            "Lab" => {
                let params = cal_params(doc, arr)?;
                ColorSpace::Lab {
                    white_point: white_point(doc, params),
                    range: fixed::<4>(
                        dict_numbers(doc, params, b"Range"),
                        [-100.0, 100.0, -100.0, 100.0],
                    ),
                }
            }
            "Pattern" => {
                let underlying = match arr.get(1) {
                    Some(obj) => Some(self.resolve_object(doc, resources, obj, depth + 1)?),
                    None => None,
                };
                ColorSpace::Pattern(underlying)
            }
            other => device_space(other)?,
        };
        Some(Arc::new(cs))
    }

    /// `[/ICCBased stream]`
    fn resolve_icc_based(
        &mut self,
        doc: &Document,
        resources: &Dictionary,
        arr: &[Object],
        depth: usize,
    ) -> Option<ColorSpace> {
        let stream = resolve_ref(doc, arr.get(1)?).as_stream().ok()?;
        let alternate = match stream.dict.get(b"Alternate") {
            Ok(obj) => self.resolve_object(doc, resources, obj, depth + 1),
            Err(_) => None,
        };
        let declared = dict_number(doc, &stream.dict, b"N").map(|n| n as usize);
        let components = declared
            .filter(|n| matches!(n, 1 | 3 | 4))
            .or_else(|| alternate.as_ref().map(|a| a.component_count()))?;
        let alternate = alternate
            .filter(|a| a.component_count() == components)
            .unwrap_or_else(|| Arc::new(device_space_for(components)));
        Some(ColorSpace::IccBased {
            components,
            alternate,
        })
    }

    /// `[/Indexed base hival lookup]`
    fn resolve_indexed(
        &mut self,
        doc: &Document,
        resources: &Dictionary,
        arr: &[Object],
        depth: usize,
    ) -> Option<ColorSpace> {
        if arr.len() < 4 {
            return None;
        }
        let base = self.resolve_object(doc, resources, &arr[1], depth + 1)?;
        let hival = match resolve_ref(doc, &arr[2]) {
            Object::Integer(n) => (*n).clamp(0, 255) as usize,
            Object::Real(f) => (*f as f64).clamp(0.0, 255.0) as usize,
            _ => return None,
        };
        let lookup = match resolve_ref(doc, &arr[3]) {
            Object::String(bytes, _) => bytes.clone(),
            Object::Stream(s) => decode_stream(s).ok()?,
            _ => return None,
        };
        Some(ColorSpace::Indexed {
            base,
            hival,
            lookup,
        })
    }

    /// `[/Separation name alternate tintTransform]`
    fn resolve_separation(
        &mut self,
        doc: &Document,
        resources: &Dictionary,
        arr: &[Object],
        depth: usize,
    ) -> Option<ColorSpace> {
        if arr.len() < 4 {
            return None;
        }
        let name = resolve_ref(doc, &arr[1])
            .as_name()
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .unwrap_or_default();
        let alternate = self.resolve_object(doc, resources, &arr[2], depth + 1)?;
        let tint = PdfFunction::parse(doc, &arr[3]).ok().map(Arc::new);
        Some(ColorSpace::Separation {
            name,
            alternate,
            tint,
        })
    }

    /// `[/DeviceN names alternate tintTransform attributes?]`
    fn resolve_device_n(
        &mut self,
        doc: &Document,
        resources: &Dictionary,
        arr: &[Object],
        depth: usize,
    ) -> Option<ColorSpace> {
        if arr.len() < 4 {
            return None;
        }
        let names: Vec<String> = resolve_ref(doc, &arr[1])
            .as_array()
            .ok()?
            .iter()
            .filter_map(|o| resolve_ref(doc, o).as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .collect();
        if names.is_empty() {
            return None;
        }
        let alternate = self.resolve_object(doc, resources, &arr[2], depth + 1)?;
        let tint = PdfFunction::parse(doc, &arr[3]).ok().map(Arc::new);
        Some(ColorSpace::DeviceN {
            names,
            alternate,
            tint,
        })
    }
}

/// Resolve a specifier without sharing a cache, falling back to DeviceGray.
pub fn resolve(doc: &Document, resources: &Dictionary, specifier: &Object) -> Arc<ColorSpace> {
    ColorSpaceCache::new()
        .resolve(doc, resources, specifier)
        .unwrap_or_else(|| Arc::new(ColorSpace::DeviceGray))
}

fn specifier_is_ref(obj: &Object) -> bool {
    matches!(obj, Object::Reference(_))
}

fn device_space(name: &str) -> Option<ColorSpace> {
    match name {
        "DeviceGray" | "G" | "CalGray" => Some(ColorSpace::DeviceGray),
        "DeviceRGB" | "RGB" | "CalRGB" => Some(ColorSpace::DeviceRgb),
        "DeviceCMYK" | "CMYK" | "CalCMYK" => Some(ColorSpace::DeviceCmyk),
        "Pattern" => Some(ColorSpace::Pattern(None)),
        _ => None,
    }
}

fn device_space_for(components: usize) -> ColorSpace {
    match components {
        3 => ColorSpace::DeviceRgb,
        4 => ColorSpace::DeviceCmyk,
        _ => ColorSpace::DeviceGray,
    }
}

fn cal_params<'a>(doc: &'a Document, arr: &'a [Object]) -> Option<&'a Dictionary> {
    resolve_ref(doc, arr.get(1)?).as_dict().ok()
}

fn white_point(doc: &Document, params: &Dictionary) -> [f32; 3] {
    fixed::<3>(dict_numbers(doc, params, b"WhitePoint"), D65)
}

fn fixed<const N: usize>(values: Option<Vec<f64>>, default: [f32; N]) -> [f32; N] {
    match values {
        Some(v) if v.len() == N => {
            let mut out = default;
            for (slot, value) in out.iter_mut().zip(v) {
                *slot = value as f32;
            }
            out
        }
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream, StringFormat, dictionary};

    fn approx(a: Rgb, b: Rgb) -> bool {
        (a.r - b.r).abs() < 0.01 && (a.g - b.g).abs() < 0.01 && (a.b - b.b).abs() < 0.01
    }

    fn name(n: &str) -> Object {
        Object::Name(n.as_bytes().to_vec())
    }

    fn exponential(c1: Vec<Object>) -> Object {
        let zeros: Vec<Object> = c1.iter().map(|_| 0.into()).collect();
        Object::Dictionary(dictionary! {
            "FunctionType" => 2,
            "Domain" => vec![0.into(), 1.into()],
            "C0" => zeros,
            "C1" => c1,
            "N" => 1,
        })
    }

    #[test]
    fn device_spaces_by_name() {
        let doc = Document::with_version("1.5");
        let res = Dictionary::new();
        let mut cache = ColorSpaceCache::new();
        for (n, count) in [("DeviceGray", 1), ("G", 1), ("RGB", 3), ("DeviceCMYK", 4)] {
            assert_eq!(
                cache.resolve_name(&doc, &res, n).unwrap().component_count(),
                count
            );
        }
        assert!(cache.resolve_name(&doc, &res, "Pattern").unwrap().is_pattern());
        assert!(cache.resolve_name(&doc, &res, "Unknown").is_none());
    }

    #[test]
    fn unresolvable_specifier_falls_back_to_gray() {
        let doc = Document::with_version("1.5");
        let cs = resolve(&doc, &Dictionary::new(), &Object::Integer(5));
        assert_eq!(*cs, ColorSpace::DeviceGray);
        let cs = resolve(&doc, &Dictionary::new(), &name("Nope"));
        assert_eq!(*cs, ColorSpace::DeviceGray);
    }

    #[test]
    fn natural_order_conversion() {
        assert_eq!(ColorSpace::DeviceRgb.to_rgb(&[1.0, 0.0, 0.0]), Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(
            ColorSpace::DeviceRgb.rgb_from_stack(&[0.0, 0.0, 1.0]),
            Rgb::new(1.0, 0.0, 0.0)
        );
        assert_eq!(ColorSpace::DeviceGray.to_rgb(&[0.5]), Rgb::gray(0.5));
    }

    #[test]
    fn gray_above_one_is_eight_bit() {
        assert!(approx(ColorSpace::DeviceGray.to_rgb(&[255.0]), Rgb::white()));
        assert!(approx(ColorSpace::DeviceGray.to_rgb(&[127.5]), Rgb::gray(0.5)));
    }

    #[test]
    fn cmyk_polynomial_corners() {
        assert_eq!(cmyk_to_rgb(0.0, 0.0, 0.0, 0.0), Rgb::white());
        assert_eq!(cmyk_to_rgb(0.0, 0.0, 0.0, 1.0), Rgb::black());
        let cyan = cmyk_to_rgb(1.0, 0.0, 0.0, 0.0);
        assert!(approx(cyan, Rgb::new(0.0, 0.6196, 0.7804)));
        let red = cmyk_to_rgb(0.0, 1.0, 1.0, 0.0);
        assert!(approx(red, Rgb::new(0.9882, 0.0, 0.0667)));
    }

    #[test]
    fn indexed_lookup_and_clamp() {
        let cs = ColorSpace::Indexed {
            base: Arc::new(ColorSpace::DeviceRgb),
            hival: 1,
            lookup: vec![255, 0, 0, 0, 255, 0],
        };
        assert_eq!(cs.component_count(), 1);
        assert_eq!(cs.to_rgb(&[0.0]), Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(cs.to_rgb(&[1.0]), Rgb::new(0.0, 1.0, 0.0));
        assert_eq!(cs.to_rgb(&[7.0]), Rgb::new(0.0, 1.0, 0.0));
        assert_eq!(cs.to_rgb(&[-3.0]), Rgb::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn indexed_from_array_with_hex_lookup() {
        let doc = Document::with_version("1.5");
        let arr = Object::Array(vec![
            name("Indexed"),
            name("DeviceRGB"),
            Object::Integer(1),
            Object::String(vec![255, 0, 0, 0, 0, 255], StringFormat::Hexadecimal),
        ]);
        let cs = resolve(&doc, &Dictionary::new(), &arr);
        assert_eq!(cs.to_rgb(&[1.0]), Rgb::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn separation_full_tint_through_cmyk_is_black() {
        let doc = Document::with_version("1.5");
        let arr = Object::Array(vec![
            name("Separation"),
            name("Black"),
            name("DeviceCMYK"),
            exponential(vec![0.into(), 0.into(), 0.into(), 1.into()]),
        ]);
        let cs = resolve(&doc, &Dictionary::new(), &arr);
        assert_eq!(cs.component_count(), 1);
        assert_eq!(cs.to_rgb(&[1.0]), Rgb::black());
        assert_eq!(cs.to_rgb(&[0.0]), Rgb::white());
    }

    #[test]
    fn separation_tint_into_rgb_keeps_channel_order() {
        let doc = Document::with_version("1.5");
        let arr = Object::Array(vec![
            name("Separation"),
            name("Spot"),
            name("DeviceRGB"),
            exponential(vec![1.into(), 0.into(), 0.into()]),
        ]);
        let cs = resolve(&doc, &Dictionary::new(), &arr);
        assert_eq!(cs.to_rgb(&[1.0]), Rgb::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn device_n_cmyk_names_convert_directly() {
        let cs = ColorSpace::DeviceN {
            names: ["Black", "cyan", "Magenta", "Yellow"]
                .map(String::from)
                .to_vec(),
            alternate: Arc::new(ColorSpace::DeviceGray),
            tint: None,
        };
        assert_eq!(cs.component_count(), 4);
        // black first in natural order
        assert_eq!(cs.to_rgb(&[1.0, 0.0, 0.0, 0.0]), Rgb::black());
        assert!(approx(
            cs.to_rgb(&[0.0, 1.0, 0.0, 0.0]),
            cmyk_to_rgb(1.0, 0.0, 0.0, 0.0)
        ));
    }

    #[test]
    fn device_n_reads_natural_order() {
        let doc = Document::with_version("1.5");
        // tint: (a, b) -> gray a via PostScript `pop`
        let mut doc = doc;
        let tint = doc.add_object(Stream::new(
            dictionary! {
                "FunctionType" => 4,
                "Domain" => vec![0.into(), 1.into(), 0.into(), 1.into()],
                "Range" => vec![0.into(), 1.into()],
            },
            b"{ pop }".to_vec(),
        ));
        let arr = Object::Array(vec![
            name("DeviceN"),
            Object::Array(vec![name("Spot1"), name("Spot2")]),
            name("DeviceGray"),
            Object::Reference(tint),
        ]);
        let cs = resolve(&doc, &Dictionary::new(), &arr);
        assert_eq!(cs.component_count(), 2);
        assert_eq!(cs.to_rgb(&[0.25, 0.75]), Rgb::gray(0.25));
        assert_eq!(cs.rgb_from_stack(&[0.25, 0.75]), Rgb::gray(0.25));
    }

    #[test]
    fn icc_based_uses_component_count_and_alternate() {
        let mut doc = Document::with_version("1.5");
        let rgb = doc.add_object(Stream::new(dictionary! { "N" => 3 }, vec![0u8; 8]));
        let cmyk = doc.add_object(Stream::new(
            dictionary! { "N" => 4, "Alternate" => "DeviceCMYK" },
            vec![0u8; 8],
        ));
        let res = Dictionary::new();
        let mut cache = ColorSpaceCache::new();
        let cs = cache
            .resolve(&doc, &res, &Object::Array(vec![name("ICCBased"), rgb.into()]))
            .unwrap();
        assert_eq!(cs.component_count(), 3);
        assert_eq!(cs.to_rgb(&[0.0, 1.0, 0.0]), Rgb::new(0.0, 1.0, 0.0));
        let cs = cache
            .resolve(&doc, &res, &Object::Array(vec![name("ICCBased"), cmyk.into()]))
            .unwrap();
        assert_eq!(cs.to_rgb(&[0.0, 0.0, 0.0, 1.0]), Rgb::black());
    }

    #[test]
    fn named_resource_resolution_is_cached_and_idempotent() {
        let mut doc = Document::with_version("1.5");
        let icc = doc.add_object(Stream::new(dictionary! { "N" => 1 }, vec![0u8; 4]));
        let cs_id = doc.add_object(Object::Array(vec![name("ICCBased"), icc.into()]));
        let res = dictionary! { "ColorSpace" => dictionary! { "CS0" => cs_id } };
        let mut cache = ColorSpaceCache::new();
        let a = cache.resolve_name(&doc, &res, "CS0").unwrap();
        let b = cache.resolve_name(&doc, &res, "CS0").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*a, *resolve(&doc, &res, &name("CS0")));
    }

    #[test]
    fn cal_and_lab_white_map_to_white() {
        let doc = Document::with_version("1.5");
        let wp = || vec![Object::Real(0.9505), 1.into(), Object::Real(1.089)];
        let gray = Object::Array(vec![
            name("CalGray"),
            Object::Dictionary(dictionary! { "WhitePoint" => wp(), "Gamma" => Object::Real(2.2) }),
        ]);
        let cs = resolve(&doc, &Dictionary::new(), &gray);
        assert!(approx(cs.to_rgb(&[1.0]), Rgb::white()));
        assert!(approx(cs.to_rgb(&[0.0]), Rgb::black()));

        let rgb = Object::Array(vec![
            name("CalRGB"),
            Object::Dictionary(dictionary! {
                "WhitePoint" => wp(),
                "Matrix" => vec![
                    Object::Real(0.4124), Object::Real(0.2126), Object::Real(0.0193),
                    Object::Real(0.3576), Object::Real(0.7152), Object::Real(0.1192),
                    Object::Real(0.1805), Object::Real(0.0722), Object::Real(0.9505),
                ],
            }),
        ]);
        let cs = resolve(&doc, &Dictionary::new(), &rgb);
        assert!(approx(cs.to_rgb(&[1.0, 1.0, 1.0]), Rgb::white()));
        assert!(approx(cs.to_rgb(&[1.0, 0.0, 0.0]), Rgb::new(1.0, 0.0, 0.0)));

        let lab = Object::Array(vec![
            name("Lab"),
            Object::Dictionary(dictionary! { "WhitePoint" => wp() }),
        ]);
        let cs = resolve(&doc, &Dictionary::new(), &lab);
        assert_eq!(cs.component_count(), 3);
        assert!(approx(cs.to_rgb(&[100.0, 0.0, 0.0]), Rgb::white()));
        assert!(approx(cs.to_rgb(&[0.0, 0.0, 0.0]), Rgb::black()));
    }

    #[test]
    fn pattern_with_underlying_space() {
        let doc = Document::with_version("1.5");
        let arr = Object::Array(vec![name("Pattern"), name("DeviceRGB")]);
        let cs = resolve(&doc, &Dictionary::new(), &arr);
        assert!(cs.is_pattern());
        assert_eq!(cs.component_count(), 3);
        assert_eq!(cs.to_rgb(&[0.0, 0.0, 1.0]), Rgb::new(0.0, 0.0, 1.0));
        assert_eq!(ColorSpace::Pattern(None).component_count(), 0);
    }

    #[test]
    fn initial_components_per_family() {
        assert_eq!(ColorSpace::DeviceCmyk.initial_components(), vec![0.0, 0.0, 0.0, 1.0]);
        assert_eq!(ColorSpace::DeviceRgb.initial_components(), vec![0.0; 3]);
        let sep = ColorSpace::Separation {
            name: "Spot".to_string(),
            alternate: Arc::new(ColorSpace::DeviceGray),
            tint: None,
        };
        assert_eq!(sep.initial_components(), vec![1.0]);
    }

    #[test]
    fn reverse_flips_order() {
        assert_eq!(reverse(&[1.0, 2.0, 3.0]), vec![3.0, 2.0, 1.0]);
        assert!(reverse(&[]).is_empty());
    }
}
