//! Two-pass text layout.
//!
//! Pass 1 resolves glyphs, splits on explicit line breaks and (optionally) wraps to a width.
//! Pass 2 walks the final lines once their boundaries are known and stamps every placement
//! with per-line / per-word counts, which the shaders use for staggered reveal effects.

use std::ops::Range;

use msdf_font::{FontDescriptor, Glyph};

use crate::error::LayoutError;

/// Horizontal alignment of each line within the layout width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Layout knobs. All distances are in font units (atlas pixels at the font's nominal size).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutOptions {
    /// Wrap width. `None` (or a non-positive width) disables wrapping.
    pub width: Option<f32>,
    pub align: Align,
    /// Extra advance added after every letter.
    pub letter_spacing: f32,
    /// Overrides the font's `lineHeight`.
    pub line_height: Option<f32>,
    /// A tab advances this many spaces.
    pub tab_size: u32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            width: None,
            align: Align::Left,
            letter_spacing: 0.0,
            line_height: None,
            tab_size: 4,
        }
    }
}

/// Input of [`layout`].
#[derive(Clone, Debug)]
pub struct TextLayoutRequest<'a> {
    pub text: &'a str,
    pub font: &'a FontDescriptor,
    pub options: LayoutOptions,
}

impl<'a> TextLayoutRequest<'a> {
    pub fn new(text: &'a str, font: &'a FontDescriptor) -> Self {
        Self {
            text,
            font,
            options: LayoutOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LayoutOptions) -> Self {
        self.options = options;
        self
    }
}

/// UV rectangle (normalized texture coords, top-left origin).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UvRect {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl UvRect {
    /// Normalize a glyph's atlas rectangle by the atlas page size.
    pub fn from_glyph(glyph: &Glyph, atlas_size: [u32; 2]) -> Self {
        let w = atlas_size[0] as f32;
        let h = atlas_size[1] as f32;
        Self {
            min: [glyph.x / w, glyph.y / h],
            max: [(glyph.x + glyph.width) / w, (glyph.y + glyph.height) / h],
        }
    }
}

/// Per-glyph classification attributes. Read-only downstream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GlyphAttributes {
    pub line_index: u32,
    /// Index of the letter within its line.
    pub line_letter_index: u32,
    pub line_letters_total: u32,
    /// Index of the word within its line. Whitespace carries the word before it, 0 if none.
    pub line_word_index: u32,
    pub line_words_total: u32,
    /// Global word index. Whitespace carries the word before it on the same line, 0 if none.
    pub word_index: u32,
    /// Global letter index over all non-break characters.
    pub letter_index: u32,
}

/// A glyph positioned in layout space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphPlacement {
    pub character: char,
    /// Top-left of the glyph quad (pen + bearing), y down.
    pub position: [f32; 2],
    /// Quad size, taken from the glyph's atlas rectangle.
    pub size: [f32; 2],
    /// Aligned pen position (without bearing).
    pub pen_x: f32,
    pub uv: UvRect,
    pub attributes: GlyphAttributes,
}

/// One laid-out line.
#[derive(Clone, Debug, PartialEq)]
pub struct LineInfo {
    /// Range into [`LayoutResult::glyphs`].
    pub glyphs: Range<usize>,
    pub letters: u32,
    pub words: u32,
    /// Width excluding trailing whitespace.
    pub width: f32,
    /// Top of the line box.
    pub top: f32,
}

/// Output of [`layout`].
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutResult {
    pub glyphs: Vec<GlyphPlacement>,
    pub lines: Vec<LineInfo>,
    /// Wrap width when wrapping, otherwise the widest line.
    pub width: f32,
    pub height: f32,
    pub line_height: f32,
    pub baseline: f32,
    pub descender: f32,
}

impl LayoutResult {
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Placements of line `line_index`.
    pub fn line_glyphs(&self, line_index: usize) -> &[GlyphPlacement] {
        self.lines
            .get(line_index)
            .map(|line| &self.glyphs[line.glyphs.clone()])
            .unwrap_or(&[])
    }
}

/// A resolved input character (line-break markers already removed).
struct Letter<'a> {
    character: char,
    glyph: &'a Glyph,
    advance: f32,
    is_whitespace: bool,
}

/// Lay out `request.text` with `request.font`.
///
/// Fails with [`LayoutError::UnknownGlyph`] when a character has no atlas entry
/// (tabs need a space glyph) and [`LayoutError::EmptyText`] for empty input.
pub fn layout(request: &TextLayoutRequest<'_>) -> Result<LayoutResult, LayoutError> {
    let font = request.font;
    let options = &request.options;

    if request.text.is_empty() {
        return Err(LayoutError::EmptyText);
    }

    // Pass 1a: resolve glyphs, split on explicit breaks.
    let mut letters = Vec::with_capacity(request.text.len());
    let mut hard_lines = Vec::new();
    let mut line_start = 0;

    let mut chars = request.text.chars().enumerate().peekable();
    while let Some((index, c)) = chars.next() {
        match c {
            '\n' => {
                hard_lines.push(line_start..letters.len());
                line_start = letters.len();
            }
            '\r' if matches!(chars.peek(), Some((_, '\n'))) => {}
            _ => letters.push(resolve_letter(font, c, index, options.tab_size)?),
        }
    }
    hard_lines.push(line_start..letters.len());

    // Pass 1b: soft wrap.
    let wrap_width = options.width.filter(|w| *w > 0.0);
    let mut lines = Vec::with_capacity(hard_lines.len());
    for hard in hard_lines {
        match wrap_width {
            Some(max_width) => wrap_line(
                font,
                &letters,
                hard,
                max_width,
                options.letter_spacing,
                &mut lines,
            ),
            None => lines.push(hard),
        }
    }

    let line_height = options.line_height.unwrap_or(font.line_height());
    let baseline = font.base();
    let widths: Vec<f32> = lines
        .iter()
        .map(|range| measure_line(font, &letters[range.clone()], options.letter_spacing))
        .collect();
    let layout_width = wrap_width.unwrap_or_else(|| widths.iter().copied().fold(0.0, f32::max));

    // Pass 2: position + stamp attributes now that line boundaries are final.
    let atlas_size = font.atlas_size();
    let mut glyphs: Vec<GlyphPlacement> = Vec::with_capacity(letters.len());
    let mut line_infos = Vec::with_capacity(lines.len());
    let mut words_seen = 0u32;

    for (line_index, (range, &line_width)) in lines.iter().zip(&widths).enumerate() {
        let line_letters = &letters[range.clone()];
        let letters_total = line_letters.len() as u32;
        let words_total = count_words(line_letters);
        let top = line_index as f32 * line_height;
        // A single overlong glyph can be wider than the wrap width; never push it left of 0.
        let offset = match options.align {
            Align::Left => 0.0,
            Align::Center => ((layout_width - line_width) * 0.5).max(0.0),
            Align::Right => (layout_width - line_width).max(0.0),
        };

        let first = glyphs.len();
        let mut pen = 0.0;
        let mut line_word: Option<u32> = None;
        let mut current_word: Option<u32> = None;
        let mut in_word = false;

        for (i, letter) in line_letters.iter().enumerate() {
            if i > 0 {
                pen += font.kerning(line_letters[i - 1].character, letter.character);
            }

            if letter.is_whitespace {
                in_word = false;
            } else if !in_word {
                in_word = true;
                line_word = Some(line_word.map_or(0, |w| w + 1));
                current_word = Some(words_seen);
                words_seen += 1;
            }

            let glyph = letter.glyph;
            let letter_index = glyphs.len() as u32;
            glyphs.push(GlyphPlacement {
                character: letter.character,
                position: [offset + pen + glyph.xoffset, top + glyph.yoffset],
                size: [glyph.width, glyph.height],
                pen_x: offset + pen,
                uv: UvRect::from_glyph(glyph, atlas_size),
                attributes: GlyphAttributes {
                    line_index: line_index as u32,
                    line_letter_index: i as u32,
                    line_letters_total: letters_total,
                    line_word_index: line_word.unwrap_or(0),
                    line_words_total: words_total,
                    word_index: current_word.unwrap_or(0),
                    letter_index,
                },
            });

            pen += letter.advance + options.letter_spacing;
        }

        line_infos.push(LineInfo {
            glyphs: first..glyphs.len(),
            letters: letters_total,
            words: words_total,
            width: line_width,
            top,
        });
    }

    log::trace!(
        "laid out {} glyphs on {} line(s), {}x{}",
        glyphs.len(),
        line_infos.len(),
        layout_width,
        line_infos.len() as f32 * line_height
    );

    Ok(LayoutResult {
        glyphs,
        height: line_infos.len() as f32 * line_height,
        lines: line_infos,
        width: layout_width,
        line_height,
        baseline,
        descender: line_height - baseline,
    })
}

fn resolve_letter(
    font: &FontDescriptor,
    character: char,
    index: usize,
    tab_size: u32,
) -> Result<Letter<'_>, LayoutError> {
    let unknown = LayoutError::UnknownGlyph { character, index };

    if character == '\t' {
        let space = font.glyph(' ').ok_or(unknown)?;
        return Ok(Letter {
            character,
            glyph: space,
            advance: space.xadvance * tab_size as f32,
            is_whitespace: true,
        });
    }

    let glyph = font.glyph(character).ok_or(unknown)?;
    Ok(Letter {
        character,
        glyph,
        advance: glyph.xadvance,
        is_whitespace: character.is_whitespace(),
    })
}

/// Greedy wrap of one hard line. Whitespace never overflows: it stays at the end of the line
/// it follows. A word wider than `max_width` is broken at the overflowing letter.
fn wrap_line(
    font: &FontDescriptor,
    letters: &[Letter<'_>],
    range: Range<usize>,
    max_width: f32,
    letter_spacing: f32,
    out: &mut Vec<Range<usize>>,
) {
    if range.is_empty() {
        out.push(range);
        return;
    }

    let mut start = range.start;
    while start < range.end {
        let mut pen = 0.0;
        let mut end = start;
        let mut last_break = None;

        for i in start..range.end {
            let letter = &letters[i];
            let kern = if i > start {
                font.kerning(letters[i - 1].character, letter.character)
            } else {
                0.0
            };
            let right = pen + kern + letter.advance;

            if !letter.is_whitespace && i > start && right > max_width {
                break;
            }

            pen = right + letter_spacing;
            end = i + 1;
            if letter.is_whitespace {
                last_break = Some(i + 1);
            }
        }

        if end < range.end {
            if let Some(b) = last_break {
                end = b;
            }
        }

        out.push(start..end);
        start = end;
    }
}

fn measure_line(font: &FontDescriptor, letters: &[Letter<'_>], letter_spacing: f32) -> f32 {
    let mut pen = 0.0;
    let mut width = 0.0;

    for (i, letter) in letters.iter().enumerate() {
        if i > 0 {
            pen += font.kerning(letters[i - 1].character, letter.character);
        }
        if !letter.is_whitespace {
            width = pen + letter.advance;
        }
        pen += letter.advance + letter_spacing;
    }

    width
}

fn count_words(letters: &[Letter<'_>]) -> u32 {
    let mut words = 0;
    let mut in_word = false;
    for letter in letters {
        if letter.is_whitespace {
            in_word = false;
        } else if !in_word {
            in_word = true;
            words += 1;
        }
    }
    words
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use msdf_font::CommonMetrics;

    /// H (advance 10), I (advance 4), space (advance 5), 64x64 atlas, line height 20.
    pub(crate) fn test_font(kernings: &[((char, char), f32)]) -> FontDescriptor {
        let common = CommonMetrics {
            line_height: 20.0,
            base: 16.0,
            scale_w: 64,
            scale_h: 64,
        };
        FontDescriptor::new(
            common,
            [
                ('H', Glyph::new('H' as u32, [0.0, 0.0, 10.0, 16.0], 10.0)),
                ('I', Glyph::new('I' as u32, [16.0, 0.0, 4.0, 16.0], 4.0)),
                (' ', Glyph::new(' ' as u32, [0.0, 0.0, 0.0, 0.0], 5.0)),
            ],
            kernings.iter().copied(),
        )
        .unwrap()
    }

    fn run(text: &str, font: &FontDescriptor, options: LayoutOptions) -> LayoutResult {
        layout(&TextLayoutRequest::new(text, font).with_options(options)).unwrap()
    }

    #[test]
    fn test_hi_scenario() {
        let font = test_font(&[]);
        let result = run("HI", &font, LayoutOptions::default());

        assert_eq!(result.glyph_count(), 2);
        assert_eq!(result.glyphs[0].position[0], 0.0);
        assert_eq!(result.glyphs[1].position[0], 10.0);
        for glyph in &result.glyphs {
            assert_eq!(glyph.attributes.line_index, 0);
            assert_eq!(glyph.attributes.line_letters_total, 2);
        }
        assert_eq!(result.width, 14.0);
        assert_eq!(result.height, 20.0);
    }

    #[test]
    fn test_kerning_and_letter_spacing() {
        let font = test_font(&[(('H', 'I'), -1.5)]);
        let kerned = run("HI", &font, LayoutOptions::default());
        assert_eq!(kerned.glyphs[1].position[0], 8.5);

        let spaced = run(
            "HI",
            &font,
            LayoutOptions {
                letter_spacing: 2.0,
                ..Default::default()
            },
        );
        assert_eq!(spaced.glyphs[1].position[0], 10.5);
    }

    #[test]
    fn test_bearing_offsets_quad() {
        let common = CommonMetrics {
            line_height: 20.0,
            base: 16.0,
            scale_w: 64,
            scale_h: 64,
        };
        let font = FontDescriptor::new(
            common,
            [(
                'H',
                Glyph::new('H' as u32, [0.0, 0.0, 10.0, 16.0], 10.0).with_offset(1.0, 3.0),
            )],
            [],
        )
        .unwrap();

        let result = run("HH", &font, LayoutOptions::default());
        assert_eq!(result.glyphs[1].pen_x, 10.0);
        assert_eq!(result.glyphs[1].position, [11.0, 3.0]);
    }

    #[test]
    fn test_line_breaks_are_not_placements() {
        let font = test_font(&[]);
        let result = run("HI\nI\r\nHH", &font, LayoutOptions::default());

        assert_eq!(result.glyph_count(), 5);
        assert_eq!(result.line_count(), 3);
        assert_eq!(
            result.lines.iter().map(|l| l.letters).collect::<Vec<_>>(),
            vec![2, 1, 2]
        );

        let chars: String = result.glyphs.iter().map(|g| g.character).collect();
        assert_eq!(chars, "HIIHH");

        let letter_indices: Vec<u32> = result
            .glyphs
            .iter()
            .map(|g| g.attributes.letter_index)
            .collect();
        assert_eq!(letter_indices, vec![0, 1, 2, 3, 4]);

        let second = result.line_glyphs(1);
        assert_eq!(second[0].attributes.line_index, 1);
        assert_eq!(second[0].position, [0.0, 20.0]);
        assert_eq!(result.lines[2].top, 40.0);
    }

    #[test]
    fn test_empty_lines_are_kept() {
        let font = test_font(&[]);
        let result = run("H\n\nI", &font, LayoutOptions::default());

        assert_eq!(result.line_count(), 3);
        assert_eq!(result.lines[1].letters, 0);
        assert_eq!(result.glyphs[1].attributes.line_index, 2);
    }

    #[test]
    fn test_unknown_glyph_fails_fast() {
        let font = test_font(&[]);
        let err = layout(&TextLayoutRequest::new("HI\nHX", &font)).unwrap_err();
        assert_eq!(
            err,
            LayoutError::UnknownGlyph {
                character: 'X',
                index: 4
            }
        );
    }

    #[test]
    fn test_empty_text_is_an_error() {
        let font = test_font(&[]);
        assert_eq!(
            layout(&TextLayoutRequest::new("", &font)).unwrap_err(),
            LayoutError::EmptyText
        );
    }

    #[test]
    fn test_word_attributes() {
        let font = test_font(&[]);
        let result = run("HI  H\nI H", &font, LayoutOptions::default());
        let attrs: Vec<GlyphAttributes> = result.glyphs.iter().map(|g| g.attributes).collect();

        // Line 0: "HI  H" -> words "HI", "H"
        assert!(attrs[..5].iter().all(|a| a.line_words_total == 2));
        assert_eq!(
            attrs[..5].iter().map(|a| a.line_word_index).collect::<Vec<_>>(),
            vec![0, 0, 0, 0, 1]
        );

        // Line 1: "I H" -> words "I", "H", global indices continue
        assert!(attrs[5..].iter().all(|a| a.line_words_total == 2));
        assert_eq!(
            attrs[5..].iter().map(|a| a.line_word_index).collect::<Vec<_>>(),
            vec![0, 0, 1]
        );
        assert_eq!(
            attrs.iter().map(|a| a.word_index).collect::<Vec<_>>(),
            vec![0, 0, 0, 0, 1, 2, 2, 3]
        );
    }

    #[test]
    fn test_leading_whitespace_does_not_inherit_previous_line_word() {
        let font = test_font(&[]);
        let result = run("H I\n H", &font, LayoutOptions::default());
        let attrs: Vec<(char, u32, u32)> = result
            .glyphs
            .iter()
            .map(|g| (g.character, g.attributes.line_word_index, g.attributes.word_index))
            .collect();

        assert_eq!(attrs[3], (' ', 0, 0));
        assert_eq!(attrs[4], ('H', 0, 2));
    }

    #[test]
    fn test_wrap_keeps_trailing_whitespace() {
        let font = test_font(&[]);
        let result = run(
            "HI HI",
            &font,
            LayoutOptions {
                width: Some(15.0),
                ..Default::default()
            },
        );

        assert_eq!(result.glyph_count(), 5);
        assert_eq!(result.line_count(), 2);
        assert_eq!(result.lines[0].letters, 3);
        assert_eq!(result.lines[0].width, 14.0);
        assert_eq!(result.lines[1].letters, 2);

        let second = result.line_glyphs(1);
        assert_eq!(second[0].character, 'H');
        assert_eq!(second[0].position, [0.0, 20.0]);
        assert_eq!(second[0].attributes.line_letter_index, 0);
        assert_eq!(result.width, 15.0);
    }

    #[test]
    fn test_wrap_breaks_long_words() {
        let font = test_font(&[]);
        let result = run(
            "HIH",
            &font,
            LayoutOptions {
                width: Some(12.0),
                ..Default::default()
            },
        );

        assert_eq!(result.line_count(), 3);
        assert!(result.lines.iter().all(|l| l.letters == 1));
    }

    #[test]
    fn test_alignment() {
        let font = test_font(&[]);

        let centered = run(
            "HI\nI",
            &font,
            LayoutOptions {
                align: Align::Center,
                ..Default::default()
            },
        );
        assert_eq!(centered.glyphs[0].position[0], 0.0);
        assert_eq!(centered.glyphs[2].position[0], 5.0);

        let right = run(
            "HI\nI",
            &font,
            LayoutOptions {
                align: Align::Right,
                ..Default::default()
            },
        );
        assert_eq!(right.glyphs[2].position[0], 10.0);
    }

    #[test]
    fn test_overlong_glyph_is_not_aligned_past_origin() {
        let font = test_font(&[]);
        for align in [Align::Center, Align::Right] {
            let result = run(
                "H",
                &font,
                LayoutOptions {
                    width: Some(5.0),
                    align,
                    ..Default::default()
                },
            );
            assert_eq!(result.glyphs[0].position[0], 0.0);
        }
    }

    #[test]
    fn test_tab_advances_spaces() {
        let font = test_font(&[]);
        let result = run(
            "\tH",
            &font,
            LayoutOptions {
                tab_size: 2,
                ..Default::default()
            },
        );
        assert_eq!(result.glyphs[1].position[0], 10.0);
    }

    #[test]
    fn test_tab_without_space_glyph_fails() {
        let common = CommonMetrics {
            line_height: 20.0,
            base: 16.0,
            scale_w: 64,
            scale_h: 64,
        };
        let font = FontDescriptor::new(
            common,
            [('H', Glyph::new('H' as u32, [0.0, 0.0, 10.0, 16.0], 10.0))],
            [],
        )
        .unwrap();

        assert_eq!(
            layout(&TextLayoutRequest::new("H\t", &font)).unwrap_err(),
            LayoutError::UnknownGlyph {
                character: '\t',
                index: 1
            }
        );
    }

    #[test]
    fn test_line_height_override_and_metrics() {
        let font = test_font(&[]);
        let result = run(
            "H\nI",
            &font,
            LayoutOptions {
                line_height: Some(30.0),
                ..Default::default()
            },
        );

        assert_eq!(result.glyphs[1].position[1], 30.0);
        assert_eq!(result.height, 60.0);
        assert_eq!(result.baseline, 16.0);
        assert_eq!(result.descender, 14.0);
    }

    #[test]
    fn test_uv_rect_normalized_by_atlas() {
        let font = test_font(&[]);
        let result = run("I", &font, LayoutOptions::default());
        let uv = result.glyphs[0].uv;

        assert_eq!(uv.min, [0.25, 0.0]);
        assert_eq!(uv.max, [0.3125, 0.25]);
    }

    #[test]
    fn test_letter_counts_are_consistent() {
        let font = test_font(&[]);
        let samples = [
            "H",
            "HI HI",
            "HI\n\nIH H",
            " H I ",
            "HHHH IIII HHHH\nI",
            "\n\n",
        ];

        for width in [None, Some(12.0), Some(25.0)] {
            for text in samples {
                let result = run(
                    text,
                    &font,
                    LayoutOptions {
                        width,
                        ..Default::default()
                    },
                );

                let expected = text.chars().filter(|c| *c != '\n').count();
                assert_eq!(result.glyph_count(), expected, "{text:?} width={width:?}");

                let total: u32 = result.lines.iter().map(|l| l.letters).sum();
                assert_eq!(total as usize, expected);

                for (line_index, line) in result.lines.iter().enumerate() {
                    let glyphs = result.line_glyphs(line_index);
                    assert_eq!(glyphs.len() as u32, line.letters);
                    for (i, glyph) in glyphs.iter().enumerate() {
                        assert_eq!(glyph.attributes.line_index as usize, line_index);
                        assert_eq!(glyph.attributes.line_letter_index as usize, i);
                        assert_eq!(glyph.attributes.line_letters_total, line.letters);
                        assert_eq!(glyph.attributes.line_words_total, line.words);
                    }
                }

                let order: String = result.glyphs.iter().map(|g| g.character).collect();
                let input: String = text.chars().filter(|c| *c != '\n').collect();
                assert_eq!(order, input);
            }
        }
    }
}
