//! Paint command set executed by the rasterizer

use super::{CanvasSize, Rect, Rgba};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Regular,
    Bold,
    Italic,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    /// Fill the whole canvas
    Fill { rgba: Rgba },
    SolidRect { rect: Rect, rgba: Rgba },
    /// Blurred copy of `rect` shifted by `offset`, drawn under later commands
    Shadow {
        rect: Rect,
        rgba: Rgba,
        blur: f32,
        offset: (i32, i32),
    },
    /// The source photo scaled into `rect`
    Image { rect: Rect },
    /// Text whose glyph bottoms sit on `baseline`
    Text {
        x: i32,
        baseline: i32,
        text: String,
        scale: u32,
        style: TextStyle,
        rgba: Rgba,
    },
}

/// Ordered commands for one canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayList {
    pub size: CanvasSize,
    pub commands: Vec<PaintCommand>,
}

impl DisplayList {
    pub fn new(size: CanvasSize) -> Self {
        Self {
            size,
            commands: Vec::new(),
        }
    }

    pub fn push(&mut self, cmd: PaintCommand) {
        self.commands.push(cmd);
    }

    /// Text commands in paint order, for assertions and logging.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            PaintCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_list_collects_texts_in_order() {
        let mut list = DisplayList::new(CanvasSize::default());
        list.push(PaintCommand::Fill { rgba: [255, 255, 255, 255] });
        for t in ["Oak", "Quercus"] {
            list.push(PaintCommand::Text {
                x: 0,
                baseline: 10,
                text: t.to_string(),
                scale: 1,
                style: TextStyle::Regular,
                rgba: [0, 0, 0, 255],
            });
        }
        assert_eq!(list.texts().collect::<Vec<_>>(), vec!["Oak", "Quercus"]);
        assert_eq!(list.commands.len(), 3);
    }
}
