use std::collections::HashMap;
use std::sync::Arc;

use vello_cpu::kurbo::Shape as _;

use crate::animation::anim::{ResolvedBar, ResolvedLayer, ResolvedVisual, evaluate_scene};
use crate::foundation::core::{Affine, Canvas, Rgba8, Vec2};
use crate::foundation::error::{WrapError, WrapResult};
use crate::render::composite::crossfade_in_place;
use crate::render::frame::FrameRGBA;
use crate::render::text::{FontSource, TextBrushRgba8, TextLayoutEngine};
use crate::scene::model::{
    Background, ChartLayer, HAlign, Layer, LayerContent, Scene, Shape, TextStyle,
};
use crate::timeline::Timeline;

const TEXT_LAYOUT_CACHE_LIMIT: usize = 512;

/// Turns resolved scene state into frames.
///
/// The compositor itself is immutable and shared; each render worker owns a
/// [`FrameRasterizer`] created through [`Compositor::rasterizer`].
#[derive(Clone, Debug)]
pub struct Compositor {
    canvas: Canvas,
    font: Option<FontSource>,
}

impl Compositor {
    pub fn new(canvas: Canvas, font: Option<FontSource>) -> WrapResult<Self> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(WrapError::validation("canvas width/height must be > 0"));
        }
        if u16::try_from(canvas.width).is_err() || u16::try_from(canvas.height).is_err() {
            return Err(WrapError::validation("canvas width/height must fit in u16"));
        }
        if font.is_none() {
            tracing::warn!("no font available, text layers will not be drawn");
        }
        Ok(Self { canvas, font })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Fresh per-worker drawing state.
    pub fn rasterizer(&self) -> WrapResult<FrameRasterizer> {
        FrameRasterizer::new(self.canvas, self.font.as_ref())
    }
}

struct FontState {
    data: vello_cpu::peniko::FontData,
    engine: TextLayoutEngine,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct TextKey {
    text: String,
    size_bits: u32,
    brush: TextBrushRgba8,
}

/// Per-worker vello_cpu context, target pixmap and paint caches.
pub struct FrameRasterizer {
    canvas: Canvas,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    font: Option<FontState>,
    layouts: HashMap<TextKey, parley::Layout<TextBrushRgba8>>,
    backgrounds: Vec<(Background, vello_cpu::Image)>,
}

impl FrameRasterizer {
    fn new(canvas: Canvas, font: Option<&FontSource>) -> WrapResult<Self> {
        let (w, h) = canvas_u16(canvas)?;
        let font = match font {
            Some(src) => Some(FontState {
                data: vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(src.bytes.as_ref().clone()),
                    0,
                ),
                engine: TextLayoutEngine::new(&src.bytes)?,
            }),
            None => None,
        };
        Ok(Self {
            canvas,
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
            font,
            layouts: HashMap::new(),
            backgrounds: Vec::new(),
        })
    }

    /// Draw `scene` at `local_time`: resolve every layer, then rasterize.
    pub fn compose(&mut self, scene: &Scene, local_time: f64) -> WrapResult<FrameRGBA> {
        let resolved = evaluate_scene(scene, local_time);
        self.render(scene, &resolved)
    }

    /// Frame at global time `t`, dissolving from the outgoing scene during overlaps.
    pub fn render_at(&mut self, timeline: &Timeline, t: f64) -> WrapResult<FrameRGBA> {
        let point = timeline.at(t);
        let current = self.compose(point.scene, point.local_time)?;
        let Some(out) = point.outgoing else {
            return Ok(current);
        };
        let mut frame = self.compose(out.scene, out.local_time)?;
        crossfade_in_place(&mut frame.data, &current.data, out.progress as f32)?;
        Ok(frame)
    }

    /// Rasterize already-resolved layers. Backgrounds go first, everything else
    /// in declared order.
    pub fn render(&mut self, scene: &Scene, resolved: &[ResolvedLayer]) -> WrapResult<FrameRGBA> {
        if resolved.len() != scene.layers.len() {
            return Err(WrapError::render(format!(
                "scene {} has {} layers but {} resolved states",
                scene.index,
                scene.layers.len(),
                resolved.len()
            )));
        }

        self.ctx.reset();
        clear_pixmap(&mut self.pixmap, [0, 0, 0, 0]);

        let pairs = scene.layers.iter().zip(resolved);
        let (backgrounds, others): (Vec<_>, Vec<_>) = pairs.partition(|(l, _)| l.is_background());
        for (layer, state) in backgrounds.into_iter().chain(others) {
            if state.opacity <= 0.0 {
                continue;
            }
            self.draw_layer(layer, state)?;
        }

        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);

        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
        })
    }

    fn draw_layer(&mut self, layer: &Layer, state: &ResolvedLayer) -> WrapResult<()> {
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        let opacity = state.opacity as f32;
        let layered = opacity < 1.0;
        if layered {
            self.ctx.push_opacity_layer(opacity);
        }

        let anchor = Affine::translate(layer.position.to_vec2() + state.offset)
            * Affine::scale(state.scale);

        let res = match (&layer.content, &state.visual) {
            (LayerContent::Background(bg), _) => self.draw_background(&bg.fill),
            (LayerContent::Text(t), ResolvedVisual::Text(s)) => {
                self.draw_text(anchor, s, &t.style);
                Ok(())
            }
            (LayerContent::Shape(s), _) => {
                self.ctx.set_transform(affine_to_cpu(anchor));
                self.ctx.set_paint(color(s.fill));
                match s.shape {
                    Shape::Rect { width, height } => {
                        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                            -width / 2.0,
                            -height / 2.0,
                            width / 2.0,
                            height / 2.0,
                        ));
                    }
                    Shape::RoundedRect {
                        width,
                        height,
                        radius,
                    } => {
                        let rr = vello_cpu::kurbo::RoundedRect::new(
                            -width / 2.0,
                            -height / 2.0,
                            width / 2.0,
                            height / 2.0,
                            radius,
                        );
                        self.ctx.fill_path(&rr.to_path(0.1));
                    }
                    Shape::Circle { radius } => {
                        let c = vello_cpu::kurbo::Circle::new((0.0, 0.0), radius);
                        self.ctx.fill_path(&c.to_path(0.1));
                    }
                }
                Ok(())
            }
            (LayerContent::Chart(chart), ResolvedVisual::Chart(bars)) => {
                self.draw_chart(anchor, chart, bars);
                Ok(())
            }
            _ => Err(WrapError::render(format!(
                "layer '{}' resolved to a mismatched visual",
                layer.name
            ))),
        };

        if layered {
            self.ctx.pop_layer();
        }
        res
    }

    fn draw_background(&mut self, fill: &Background) -> WrapResult<()> {
        let (cw, ch) = (
            f64::from(self.canvas.width),
            f64::from(self.canvas.height),
        );
        let full = vello_cpu::kurbo::Rect::new(0.0, 0.0, cw, ch);

        match fill {
            Background::Solid(c) => {
                self.ctx
                    .set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                self.ctx.set_paint(color(*c));
                self.ctx.fill_rect(&full);
            }
            Background::VerticalGradient { .. } => {
                let paint = self.background_paint(fill)?;
                self.ctx
                    .set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                self.ctx.set_paint(paint);
                self.ctx.fill_rect(&full);
            }
            Background::Image(img) => {
                if img.width == 0 || img.height == 0 {
                    return Err(WrapError::render("background image has zero size"));
                }
                let (iw, ih) = (f64::from(img.width), f64::from(img.height));
                // Cover: scale up until both sides fill the canvas, then center.
                let s = (cw / iw).max(ch / ih);
                let dx = (cw - iw * s) / 2.0;
                let dy = (ch - ih * s) / 2.0;
                let paint = self.background_paint(fill)?;
                self.ctx.set_transform(affine_to_cpu(
                    Affine::translate(Vec2::new(dx, dy)) * Affine::scale(s),
                ));
                self.ctx.set_paint(paint);
                self.ctx
                    .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
            }
        }
        Ok(())
    }

    fn background_paint(&mut self, fill: &Background) -> WrapResult<vello_cpu::Image> {
        if let Some((_, paint)) = self.backgrounds.iter().find(|(b, _)| same_background(b, fill)) {
            return Ok(paint.clone());
        }

        let pixmap = match fill {
            Background::VerticalGradient { top, bottom } => {
                gradient_pixmap(self.canvas, *top, *bottom)?
            }
            Background::Image(img) => {
                premul_bytes_to_pixmap(&img.rgba8_premul, img.width, img.height)?
            }
            Background::Solid(_) => {
                return Err(WrapError::render("solid backgrounds do not use an image paint"));
            }
        };
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.backgrounds.push((fill.clone(), paint.clone()));
        Ok(paint)
    }

    /// Text anchored at the transform origin: vertically centered, horizontally per `align`.
    fn draw_text(&mut self, anchor: Affine, text: &str, style: &TextStyle) {
        let Some(font) = self.font.as_mut() else {
            return;
        };
        if text.is_empty() {
            return;
        }

        let brush = TextBrushRgba8 {
            r: style.color.r,
            g: style.color.g,
            b: style.color.b,
            a: style.color.a,
        };
        let key = TextKey {
            text: text.to_owned(),
            size_bits: style.size_px.to_bits(),
            brush,
        };
        if !self.layouts.contains_key(&key) {
            if self.layouts.len() >= TEXT_LAYOUT_CACHE_LIMIT {
                self.layouts.clear();
            }
            match font.engine.layout_plain(text, style.size_px, brush) {
                Ok(layout) => {
                    self.layouts.insert(key.clone(), layout);
                }
                Err(e) => {
                    tracing::warn!(error = %e, text, "text layout failed, skipping");
                    return;
                }
            }
        }
        let Some(layout) = self.layouts.get(&key) else {
            return;
        };

        let w = f64::from(layout.width());
        let h = f64::from(layout.height());
        let x = match style.align {
            HAlign::Left => 0.0,
            HAlign::Center => -w / 2.0,
            HAlign::Right => -w,
        };
        let transform = anchor * Affine::translate(Vec2::new(x, -h / 2.0));
        self.ctx.set_transform(affine_to_cpu(transform));

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };

                let brush = run.style().brush;
                self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));

                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                self.ctx
                    .glyph_run(&font.data)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
    }

    /// Bars grow upward from the baseline at the transform origin, month labels sit
    /// below it and value labels ride on top of each bar.
    fn draw_chart(&mut self, anchor: Affine, chart: &ChartLayer, bars: &[ResolvedBar]) {
        let step = chart.bar_width + chart.gap;
        for (i, (bar, state)) in chart.bars.iter().zip(bars).enumerate() {
            let x = i as f64 * step;
            let cx = x + chart.bar_width / 2.0;

            if state.length_px > 0.0 {
                self.ctx.set_transform(affine_to_cpu(anchor));
                self.ctx.set_paint(color(bar.color));
                self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    x,
                    -state.length_px,
                    x + chart.bar_width,
                    0.0,
                ));
            }

            let label_y = f64::from(chart.label_style.size_px) * 0.9;
            self.draw_text(
                anchor * Affine::translate(Vec2::new(cx, label_y)),
                &bar.label,
                &chart.label_style,
            );

            if let Some(value) = &state.value_label {
                let value_y = -state.length_px - f64::from(chart.value_style.size_px) * 0.8;
                self.draw_text(
                    anchor * Affine::translate(Vec2::new(cx, value_y)),
                    value,
                    &chart.value_style,
                );
            }
        }
    }
}

fn canvas_u16(canvas: Canvas) -> WrapResult<(u16, u16)> {
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| WrapError::render("canvas width exceeds u16"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| WrapError::render("canvas height exceeds u16"))?;
    Ok((w, h))
}

fn same_background(a: &Background, b: &Background) -> bool {
    match (a, b) {
        (Background::Image(x), Background::Image(y)) => Arc::ptr_eq(x, y),
        _ => a == b,
    }
}

fn gradient_pixmap(canvas: Canvas, top: Rgba8, bottom: Rgba8) -> WrapResult<vello_cpu::Pixmap> {
    let (w, h) = canvas_u16(canvas)?;
    let denom = f64::from(canvas.height.saturating_sub(1).max(1));
    let mut pixels = Vec::with_capacity(usize::from(w) * usize::from(h));
    let mut opaque = true;
    for y in 0..canvas.height {
        let t = f64::from(y) / denom;
        let mix = |a: u8, b: u8| -> u8 {
            crate::foundation::math::lerp(f64::from(a), f64::from(b), t).round() as u8
        };
        let row = Rgba8 {
            r: mix(top.r, bottom.r),
            g: mix(top.g, bottom.g),
            b: mix(top.b, bottom.b),
            a: mix(top.a, bottom.a),
        }
        .premul();
        opaque &= row.a == 255;
        let px = vello_cpu::peniko::color::PremulRgba8 {
            r: row.r,
            g: row.g,
            b: row.b,
            a: row.a,
        };
        pixels.extend(std::iter::repeat_n(px, usize::from(w)));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, !opaque,
    ))
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> WrapResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| WrapError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| WrapError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(WrapError::render("background image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        may_have_opacities |= px[3] != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        });
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    for px in pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

fn color(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
