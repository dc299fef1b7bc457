/**
 * In-Memory Document
 *
 * A minimal layer stack implementing `LayerHost`, so separations run
 * without an editor: paint layers with an arbitrary pixel extent, nested
 * groups, per-layer blend mode, opacity and visibility.
 *
 * COMPOSITING
 * ===========
 * Layers are composited bottom to top with the separable blend formula
 *
 *   co = cs·as·(1 − ab) + cb·ab·(1 − as) + as·ab·B(cs, cb)
 *   ao = as + ab·(1 − as)
 *
 * where `as` already includes the layer opacity. Groups are isolated: their
 * children are flattened onto a transparent canvas first, then the result is
 * composited like a single layer.
 */

use std::collections::BTreeMap;

use image::{Rgba, RgbaImage};

use crate::color::Color;
use crate::filter::Filter;
use crate::layer::{BlendMode, LayerError, LayerHost, LayerId, Rect, Result};

/// Name given to the root group
const ROOT_NAME: &str = "root";

/// Name given to new fill layers
const FILL_NAME: &str = "Fill";

#[derive(Debug, Clone)]
enum NodeKind {
    Paint { pixels: RgbaImage, x: i32, y: i32 },
    Group { children: Vec<LayerId> },
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    visible: bool,
    opacity: u8,
    blend_mode: BlendMode,
    parent: Option<LayerId>,
    kind: NodeKind,
}

impl Node {
    fn new(name: &str, parent: Option<LayerId>, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            visible: true,
            opacity: 255,
            blend_mode: BlendMode::Normal,
            parent,
            kind,
        }
    }
}

/// Layer stack held in memory
#[derive(Debug, Clone)]
pub struct Document {
    width: u32,
    height: u32,
    nodes: BTreeMap<LayerId, Node>,
    root: LayerId,
    next_id: u32,
}

impl Document {
    /// Create an empty document
    pub fn new(width: u32, height: u32) -> Self {
        let root = LayerId::new(0);
        let mut nodes = BTreeMap::new();
        nodes.insert(
            root,
            Node::new(ROOT_NAME, None, NodeKind::Group { children: Vec::new() }),
        );

        Self {
            width,
            height,
            nodes,
            root,
            next_id: 1,
        }
    }

    /// Create a document holding a single image layer
    ///
    /// Returns the document and the id of the layer.
    pub fn from_image(name: &str, image: RgbaImage) -> (Self, LayerId) {
        let mut document = Self::new(image.width(), image.height());
        let layer = document.add_image_layer(name, image);
        (document, layer)
    }

    /// Root group
    pub fn root(&self) -> LayerId {
        self.root
    }

    /// Add a paint layer at the top of the root group, at the origin
    pub fn add_image_layer(&mut self, name: &str, image: RgbaImage) -> LayerId {
        self.add_layer(name, image, 0, 0)
    }

    /// Add a paint layer at the top of the root group, at (x, y)
    pub fn add_layer(&mut self, name: &str, pixels: RgbaImage, x: i32, y: i32) -> LayerId {
        let id = self.allocate_id();
        let root = self.root;
        self.nodes
            .insert(id, Node::new(name, Some(root), NodeKind::Paint { pixels, x, y }));
        if let Some(NodeKind::Group { children }) = self.nodes.get_mut(&root).map(|n| &mut n.kind) {
            children.push(id);
        }
        id
    }

    /// Layer blend mode
    pub fn blend_mode(&self, layer: LayerId) -> Result<BlendMode> {
        Ok(self.node(layer)?.blend_mode)
    }

    /// Pixels of a paint layer over the whole canvas
    pub fn layer_image(&self, layer: LayerId) -> Result<RgbaImage> {
        self.read_pixels(layer, Rect::from_size(self.width, self.height))
    }

    /// Composite of the visible children of a group over the whole canvas
    pub fn render_group(&self, group: LayerId) -> Result<RgbaImage> {
        let mut canvas = RgbaImage::new(self.width, self.height);

        for child in self.group_children(group)?.clone() {
            let node = self.node(child)?;
            if !node.visible {
                continue;
            }
            match &node.kind {
                NodeKind::Paint { pixels, x, y } => {
                    composite(&mut canvas, (0, 0), pixels, (*x, *y), node.blend_mode, node.opacity);
                }
                NodeKind::Group { .. } => {
                    let flattened = self.render_group(child)?;
                    composite(&mut canvas, (0, 0), &flattened, (0, 0), node.blend_mode, node.opacity);
                }
            }
        }

        Ok(canvas)
    }

    /// Composite of the whole document
    pub fn flatten(&self) -> Result<RgbaImage> {
        self.render_group(self.root)
    }

    fn allocate_id(&mut self) -> LayerId {
        let id = LayerId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn node(&self, id: LayerId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(LayerError::UnknownLayer(id))
    }

    fn node_mut(&mut self, id: LayerId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or(LayerError::UnknownLayer(id))
    }

    fn paint(&self, id: LayerId) -> Result<(&RgbaImage, i32, i32)> {
        match &self.node(id)?.kind {
            NodeKind::Paint { pixels, x, y } => Ok((pixels, *x, *y)),
            NodeKind::Group { .. } => Err(LayerError::NotAPaintLayer(id)),
        }
    }

    fn paint_mut(&mut self, id: LayerId) -> Result<(&mut RgbaImage, &mut i32, &mut i32)> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Paint { pixels, x, y } => Ok((pixels, x, y)),
            NodeKind::Group { .. } => Err(LayerError::NotAPaintLayer(id)),
        }
    }

    fn group_children(&self, id: LayerId) -> Result<&Vec<LayerId>> {
        match &self.node(id)?.kind {
            NodeKind::Group { children } => Ok(children),
            NodeKind::Paint { .. } => Err(LayerError::NotAGroup(id)),
        }
    }

    fn group_children_mut(&mut self, id: LayerId) -> Result<&mut Vec<LayerId>> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Group { children } => Ok(children),
            NodeKind::Paint { .. } => Err(LayerError::NotAGroup(id)),
        }
    }

    /// Attach `child` to `group`, directly above `above` or on top
    fn insert_child(&mut self, group: LayerId, above: Option<LayerId>, child: LayerId) -> Result<()> {
        let children = self.group_children_mut(group)?;
        let index = match above {
            Some(sibling) => {
                children
                    .iter()
                    .position(|id| *id == sibling)
                    .ok_or(LayerError::UnknownLayer(sibling))?
                    + 1
            }
            None => children.len(),
        };
        children.insert(index, child);
        self.node_mut(child)?.parent = Some(group);
        Ok(())
    }

    /// Copy a node and its descendants without attaching the copy
    fn clone_subtree(&mut self, source: LayerId) -> Result<LayerId> {
        let mut copy = self.node(source)?.clone();
        let id = self.allocate_id();

        if let NodeKind::Group { children } = &copy.kind {
            let originals = children.clone();
            let mut copies = Vec::with_capacity(originals.len());
            for child in originals {
                let child_copy = self.clone_subtree(child)?;
                self.node_mut(child_copy)?.parent = Some(id);
                copies.push(child_copy);
            }
            copy.kind = NodeKind::Group { children: copies };
        }

        copy.parent = None;
        self.nodes.insert(id, copy);
        Ok(id)
    }

    fn drop_subtree(&mut self, id: LayerId) {
        if let Some(node) = self.nodes.remove(&id) {
            if let NodeKind::Group { children } = node.kind {
                for child in children {
                    self.drop_subtree(child);
                }
            }
        }
    }
}

impl LayerHost for Document {
    fn canvas_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn layer_name(&self, layer: LayerId) -> Result<String> {
        Ok(self.node(layer)?.name.clone())
    }

    fn set_layer_name(&mut self, layer: LayerId, name: &str) -> Result<()> {
        self.node_mut(layer)?.name = name.to_string();
        Ok(())
    }

    fn is_group(&self, layer: LayerId) -> Result<bool> {
        Ok(matches!(self.node(layer)?.kind, NodeKind::Group { .. }))
    }

    fn parent(&self, layer: LayerId) -> Result<Option<LayerId>> {
        Ok(self.node(layer)?.parent)
    }

    fn children(&self, group: LayerId) -> Result<Vec<LayerId>> {
        self.group_children(group).cloned()
    }

    fn bounds(&self, layer: LayerId) -> Result<Rect> {
        match &self.node(layer)?.kind {
            NodeKind::Paint { pixels, x, y } => Ok(Rect::new(*x, *y, pixels.width(), pixels.height())),
            NodeKind::Group { children } => {
                let mut bounds = Rect::default();
                for child in children {
                    bounds = bounds.union(&self.bounds(*child)?);
                }
                Ok(bounds)
            }
        }
    }

    fn is_visible(&self, layer: LayerId) -> Result<bool> {
        Ok(self.node(layer)?.visible)
    }

    fn set_visible(&mut self, layer: LayerId, visible: bool) -> Result<()> {
        self.node_mut(layer)?.visible = visible;
        Ok(())
    }

    fn create_group(&mut self, name: &str, sibling: LayerId) -> Result<LayerId> {
        let parent = self.node(sibling)?.parent.ok_or(LayerError::RootLayer)?;
        let id = self.allocate_id();
        self.nodes
            .insert(id, Node::new(name, None, NodeKind::Group { children: Vec::new() }));
        self.insert_child(parent, Some(sibling), id)?;
        Ok(id)
    }

    fn duplicate(&mut self, source: LayerId, group: LayerId, above: Option<LayerId>) -> Result<LayerId> {
        // Validate the destination before allocating anything
        self.group_children(group)?;
        if source == self.root {
            return Err(LayerError::RootLayer);
        }
        let copy = self.clone_subtree(source)?;
        if let Err(err) = self.insert_child(group, above, copy) {
            self.drop_subtree(copy);
            return Err(err);
        }
        Ok(copy)
    }

    fn create_fill(&mut self, color: Color, group: LayerId, above: Option<LayerId>) -> Result<LayerId> {
        self.group_children(group)?;
        let pixels = RgbaImage::from_pixel(self.width, self.height, color.to_rgba());
        let id = self.allocate_id();
        self.nodes
            .insert(id, Node::new(FILL_NAME, None, NodeKind::Paint { pixels, x: 0, y: 0 }));
        if let Err(err) = self.insert_child(group, above, id) {
            self.drop_subtree(id);
            return Err(err);
        }
        Ok(id)
    }

    fn remove(&mut self, layer: LayerId) -> Result<()> {
        let parent = self.node(layer)?.parent.ok_or(LayerError::RootLayer)?;
        self.group_children_mut(parent)?.retain(|id| *id != layer);
        self.drop_subtree(layer);
        Ok(())
    }

    fn merge_down(&mut self, layer: LayerId) -> Result<LayerId> {
        let parent = self.node(layer)?.parent.ok_or(LayerError::RootLayer)?;
        let siblings = self.group_children(parent)?;
        let index = siblings
            .iter()
            .position(|id| *id == layer)
            .ok_or(LayerError::UnknownLayer(layer))?;
        if index == 0 {
            return Err(LayerError::NothingBelow(layer));
        }
        let below = siblings[index - 1];

        let upper = self.node(layer)?;
        let (mode, opacity, visible) = (upper.blend_mode, upper.opacity, upper.visible);
        let (upper_pixels, ux, uy) = self.paint(layer)?;
        let upper_pixels = upper_pixels.clone();
        let upper_rect = Rect::new(ux, uy, upper_pixels.width(), upper_pixels.height());

        let (lower_pixels, lx, ly) = self.paint(below)?;
        let lower_rect = Rect::new(lx, ly, lower_pixels.width(), lower_pixels.height());
        let union = lower_rect.union(&upper_rect);

        let mut merged = RgbaImage::new(union.width, union.height);
        blit(&mut merged, (union.x, union.y), lower_pixels, (lx, ly));
        if visible {
            composite(&mut merged, (union.x, union.y), &upper_pixels, (ux, uy), mode, opacity);
        }

        let (pixels, x, y) = self.paint_mut(below)?;
        *pixels = merged;
        *x = union.x;
        *y = union.y;

        self.remove(layer)?;
        Ok(below)
    }

    fn crop(&mut self, layer: LayerId, rect: Rect) -> Result<()> {
        let (pixels, x, y) = self.paint(layer)?;
        let mut cropped = RgbaImage::new(rect.width, rect.height);
        blit(&mut cropped, (rect.x, rect.y), pixels, (x, y));

        let (pixels, x, y) = self.paint_mut(layer)?;
        *pixels = cropped;
        *x = rect.x;
        *y = rect.y;
        Ok(())
    }

    fn set_blend_mode(&mut self, layer: LayerId, mode: BlendMode) -> Result<()> {
        self.node_mut(layer)?.blend_mode = mode;
        Ok(())
    }

    fn set_opacity(&mut self, layer: LayerId, opacity: u8) -> Result<()> {
        self.node_mut(layer)?.opacity = opacity;
        Ok(())
    }

    fn read_pixels(&self, layer: LayerId, rect: Rect) -> Result<RgbaImage> {
        let (pixels, x, y) = self.paint(layer)?;
        let mut region = RgbaImage::new(rect.width, rect.height);
        blit(&mut region, (rect.x, rect.y), pixels, (x, y));
        Ok(region)
    }

    fn write_pixels(&mut self, layer: LayerId, x: i32, y: i32, pixels: &RgbaImage) -> Result<()> {
        let current = self.bounds(layer)?;
        let (layer_pixels, lx, ly) = self.paint_mut(layer)?;

        // Grow the layer when the write reaches past its extent
        let target = Rect::new(x, y, pixels.width(), pixels.height());
        let extent = current.union(&target);
        if extent != current {
            let mut grown = RgbaImage::new(extent.width, extent.height);
            blit(&mut grown, (extent.x, extent.y), layer_pixels, (*lx, *ly));
            *layer_pixels = grown;
            *lx = extent.x;
            *ly = extent.y;
        }

        blit(layer_pixels, (*lx, *ly), pixels, (x, y));
        Ok(())
    }

    fn apply_filter(&mut self, layer: LayerId, filter: &Filter, rect: Rect) -> Result<()> {
        let mut region = self.read_pixels(layer, rect)?;
        filter.apply(&mut region);
        self.write_pixels(layer, rect.x, rect.y, &region)
    }
}

/// Canvas-space overlap of two buffers as `(left, top, right, bottom)`
fn overlap(
    dst: (u32, u32),
    dst_origin: (i32, i32),
    src: (u32, u32),
    src_origin: (i32, i32),
) -> Option<(i64, i64, i64, i64)> {
    let left = (dst_origin.0 as i64).max(src_origin.0 as i64);
    let top = (dst_origin.1 as i64).max(src_origin.1 as i64);
    let right = (dst_origin.0 as i64 + dst.0 as i64).min(src_origin.0 as i64 + src.0 as i64);
    let bottom = (dst_origin.1 as i64 + dst.1 as i64).min(src_origin.1 as i64 + src.1 as i64);

    if left < right && top < bottom {
        Some((left, top, right, bottom))
    } else {
        None
    }
}

/// Copy the overlapping part of `src` into `dst`, replacing pixels
fn blit(dst: &mut RgbaImage, dst_origin: (i32, i32), src: &RgbaImage, src_origin: (i32, i32)) {
    let Some((left, top, right, bottom)) = overlap(dst.dimensions(), dst_origin, src.dimensions(), src_origin)
    else {
        return;
    };

    for y in top..bottom {
        for x in left..right {
            let pixel = *src.get_pixel((x - src_origin.0 as i64) as u32, (y - src_origin.1 as i64) as u32);
            dst.put_pixel((x - dst_origin.0 as i64) as u32, (y - dst_origin.1 as i64) as u32, pixel);
        }
    }
}

/// Composite the overlapping part of `src` onto `dst`
fn composite(
    dst: &mut RgbaImage,
    dst_origin: (i32, i32),
    src: &RgbaImage,
    src_origin: (i32, i32),
    mode: BlendMode,
    opacity: u8,
) {
    if opacity == 0 {
        return;
    }
    let Some((left, top, right, bottom)) = overlap(dst.dimensions(), dst_origin, src.dimensions(), src_origin)
    else {
        return;
    };

    let opacity = opacity as f32 / 255.0;

    for y in top..bottom {
        for x in left..right {
            let source = *src.get_pixel((x - src_origin.0 as i64) as u32, (y - src_origin.1 as i64) as u32);
            let dx = (x - dst_origin.0 as i64) as u32;
            let dy = (y - dst_origin.1 as i64) as u32;
            let backdrop = *dst.get_pixel(dx, dy);
            dst.put_pixel(dx, dy, blend_pixel(source, backdrop, mode, opacity));
        }
    }
}

/// Blend one pixel over another
#[inline]
fn blend_pixel(source: Rgba<u8>, backdrop: Rgba<u8>, mode: BlendMode, opacity: f32) -> Rgba<u8> {
    let sa = source[3] as f32 / 255.0 * opacity;
    if sa <= 0.0 {
        return backdrop;
    }
    let ba = backdrop[3] as f32 / 255.0;
    let alpha = sa + ba * (1.0 - sa);

    let mut out = [0u8; 4];
    for channel in 0..3 {
        let cs = source[channel] as f32 / 255.0;
        let cb = backdrop[channel] as f32 / 255.0;
        let mixed = mode.blend(cs, cb);
        let color = cs * sa * (1.0 - ba) + cb * ba * (1.0 - sa) + sa * ba * mixed;
        out[channel] = to_byte(color / alpha);
    }
    out[3] = to_byte(alpha);

    Rgba(out)
}

#[inline]
fn to_byte(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::DesaturateMethod;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(rgba))
    }

    #[test]
    fn test_from_image() {
        let (document, layer) = Document::from_image("Background", solid(8, 4, [1, 2, 3, 255]));
        assert_eq!(document.canvas_size(), (8, 4));
        assert_eq!(document.layer_name(layer).unwrap(), "Background");
        assert_eq!(document.parent(layer).unwrap(), Some(document.root()));
        assert_eq!(document.bounds(layer).unwrap(), Rect::from_size(8, 4));
        assert!(!document.is_group(layer).unwrap());
    }

    #[test]
    fn test_group_is_created_above_sibling() {
        let mut document = Document::new(4, 4);
        let bottom = document.add_image_layer("bottom", solid(4, 4, [0, 0, 0, 255]));
        let top = document.add_image_layer("top", solid(4, 4, [0, 0, 0, 255]));

        let group = document.create_group("group", bottom).unwrap();
        assert_eq!(document.children(document.root()).unwrap(), vec![bottom, group, top]);
        assert!(document.is_group(group).unwrap());
        assert_eq!(document.create_group("x", document.root()), Err(LayerError::RootLayer));
    }

    #[test]
    fn test_duplicate_ordering() {
        let (mut document, source) = Document::from_image("src", solid(4, 4, [9, 9, 9, 255]));
        let group = document.create_group("group", source).unwrap();

        let first = document.duplicate(source, group, None).unwrap();
        let second = document.duplicate(source, group, None).unwrap();
        let between = document.duplicate(source, group, Some(first)).unwrap();

        assert_eq!(document.children(group).unwrap(), vec![first, between, second]);
        assert_eq!(document.layer_name(second).unwrap(), "src");
        assert_eq!(document.layer_image(second).unwrap(), document.layer_image(source).unwrap());

        // Copies are independent
        document
            .write_pixels(first, 0, 0, &solid(1, 1, [200, 0, 0, 255]))
            .unwrap();
        assert_eq!(document.layer_image(source).unwrap().get_pixel(0, 0)[0], 9);
    }

    #[test]
    fn test_duplicate_into_paint_layer_fails() {
        let (mut document, source) = Document::from_image("src", solid(2, 2, [0, 0, 0, 255]));
        assert_eq!(
            document.duplicate(source, source, None),
            Err(LayerError::NotAGroup(source))
        );
    }

    #[test]
    fn test_fill_layer() {
        let (mut document, source) = Document::from_image("src", solid(3, 2, [0, 0, 0, 255]));
        let group = document.create_group("group", source).unwrap();
        let fill = document.create_fill(Color::YELLOW, group, None).unwrap();

        assert_eq!(document.bounds(fill).unwrap(), Rect::from_size(3, 2));
        for pixel in document.layer_image(fill).unwrap().pixels() {
            assert_eq!(pixel, &Rgba([255, 255, 0, 255]));
        }
    }

    #[test]
    fn test_merge_down_add() {
        let (mut document, source) = Document::from_image("src", solid(4, 4, [255, 0, 0, 255]));
        let group = document.create_group("group", source).unwrap();
        let copy = document.duplicate(source, group, None).unwrap();
        let fill = document.create_fill(Color::YELLOW, group, Some(copy)).unwrap();
        document.set_blend_mode(fill, BlendMode::Add).unwrap();

        let merged = document.merge_down(fill).unwrap();

        assert_eq!(merged, copy);
        assert_eq!(document.children(group).unwrap(), vec![copy]);
        assert_eq!(
            document.layer_image(merged).unwrap().get_pixel(2, 2),
            &Rgba([255, 255, 0, 255])
        );
        assert_eq!(document.merge_down(merged), Err(LayerError::NothingBelow(merged)));
    }

    #[test]
    fn test_merge_down_covers_union() {
        let mut document = Document::new(10, 10);
        let lower = document.add_layer("lower", solid(2, 2, [0, 0, 0, 255]), 0, 0);
        let upper = document.add_layer("upper", solid(2, 2, [255, 255, 255, 255]), 6, 7);

        let merged = document.merge_down(upper).unwrap();
        assert_eq!(merged, lower);
        assert_eq!(document.bounds(merged).unwrap(), Rect::new(0, 0, 8, 9));

        document.crop(merged, Rect::from_size(10, 10)).unwrap();
        let image = document.layer_image(merged).unwrap();
        assert_eq!(image.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(image.get_pixel(7, 8), &Rgba([255, 255, 255, 255]));
        assert_eq!(image.get_pixel(4, 4)[3], 0);
    }

    #[test]
    fn test_merge_down_with_opacity() {
        let mut document = Document::new(1, 1);
        document.add_image_layer("lower", solid(1, 1, [0, 0, 0, 255]));
        let upper = document.add_image_layer("upper", solid(1, 1, [255, 255, 255, 255]));
        document.set_opacity(upper, 128).unwrap();

        let merged = document.merge_down(upper).unwrap();
        let pixel = document.layer_image(merged).unwrap();
        assert_eq!(pixel.get_pixel(0, 0), &Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn test_crop() {
        let (mut document, layer) = Document::from_image("src", solid(4, 4, [7, 7, 7, 255]));
        document.crop(layer, Rect::new(-2, 1, 4, 2)).unwrap();

        assert_eq!(document.bounds(layer).unwrap(), Rect::new(-2, 1, 4, 2));
        let pixels = document.read_pixels(layer, Rect::new(-2, 1, 4, 2)).unwrap();
        assert_eq!(pixels.get_pixel(0, 0)[3], 0);
        assert_eq!(pixels.get_pixel(2, 0), &Rgba([7, 7, 7, 255]));
    }

    #[test]
    fn test_write_extends_bounds() {
        let mut document = Document::new(8, 8);
        let layer = document.add_layer("small", solid(2, 2, [1, 1, 1, 255]), 2, 2);

        document
            .write_pixels(layer, 5, 5, &solid(2, 2, [9, 9, 9, 255]))
            .unwrap();

        assert_eq!(document.bounds(layer).unwrap(), Rect::new(2, 2, 5, 5));
        let image = document.layer_image(layer).unwrap();
        assert_eq!(image.get_pixel(2, 2), &Rgba([1, 1, 1, 255]));
        assert_eq!(image.get_pixel(6, 6), &Rgba([9, 9, 9, 255]));
        assert_eq!(image.get_pixel(4, 4)[3], 0);
    }

    #[test]
    fn test_read_outside_is_transparent() {
        let (document, layer) = Document::from_image("src", solid(2, 2, [5, 5, 5, 255]));
        let region = document.read_pixels(layer, Rect::new(1, 1, 3, 3)).unwrap();
        assert_eq!(region.get_pixel(0, 0), &Rgba([5, 5, 5, 255]));
        assert_eq!(region.get_pixel(2, 2)[3], 0);
    }

    #[test]
    fn test_apply_filter() {
        let (mut document, layer) = Document::from_image("src", solid(3, 3, [255, 0, 0, 255]));
        document
            .apply_filter(layer, &Filter::Desaturate(DesaturateMethod::Minimum), Rect::from_size(3, 3))
            .unwrap();
        assert_eq!(document.layer_image(layer).unwrap().get_pixel(1, 1), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_pixel_operations_reject_groups() {
        let (mut document, source) = Document::from_image("src", solid(2, 2, [0, 0, 0, 255]));
        let group = document.create_group("group", source).unwrap();
        assert_eq!(
            document.read_pixels(group, Rect::from_size(2, 2)),
            Err(LayerError::NotAPaintLayer(group))
        );
        assert_eq!(
            document.crop(group, Rect::from_size(2, 2)),
            Err(LayerError::NotAPaintLayer(group))
        );
    }

    #[test]
    fn test_remove() {
        let (mut document, source) = Document::from_image("src", solid(2, 2, [0, 0, 0, 255]));
        let group = document.create_group("group", source).unwrap();
        let child = document.duplicate(source, group, None).unwrap();

        document.remove(group).unwrap();

        assert_eq!(document.children(document.root()).unwrap(), vec![source]);
        assert_eq!(document.layer_name(child), Err(LayerError::UnknownLayer(child)));
        assert_eq!(document.remove(document.root()), Err(LayerError::RootLayer));
    }

    #[test]
    fn test_flatten_multiply_group() {
        let (mut document, source) = Document::from_image("src", solid(2, 2, [0, 0, 0, 255]));
        let group = document.create_group("inks", source).unwrap();
        let yellow = document.create_fill(Color::YELLOW, group, None).unwrap();
        let cyan = document.create_fill(Color::CYAN, group, Some(yellow)).unwrap();
        document.set_blend_mode(yellow, BlendMode::Multiply).unwrap();
        document.set_blend_mode(cyan, BlendMode::Multiply).unwrap();

        // Yellow over transparent, then cyan multiplied onto it
        let inks = document.render_group(group).unwrap();
        assert_eq!(inks.get_pixel(0, 0), &Rgba([0, 255, 0, 255]));

        // Hidden layers do not contribute
        document.set_visible(group, false).unwrap();
        assert_eq!(document.flatten().unwrap().get_pixel(1, 1), &Rgba([0, 0, 0, 255]));
    }
}
