use annot_model::{
    color::{DEFAULT_DRAWING_COLOR, DEFAULT_HIGHLIGHT_COLOR, DEFAULT_TEXT_COLOR},
    AnnotationDraft, PathPoint,
};

/// Highlight clicks produce a rect of this size centered on the click.
pub const HIGHLIGHT_WIDTH: f32 = 100.0;
pub const HIGHLIGHT_HEIGHT: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnnotationMode {
    #[default]
    None,
    Text,
    Highlight,
    Drawing,
}

/// Asks the user for the content of a text annotation. `None` means the
/// request was cancelled.
pub trait TextPrompt {
    fn request_text(&mut self) -> Option<String>;
}

/// Prompt for hosts without any text input surface; always cancels.
#[derive(Debug, Default)]
pub struct NoPrompt;

impl TextPrompt for NoPrompt {
    fn request_text(&mut self) -> Option<String> {
        None
    }
}

#[derive(Debug)]
struct Gesture {
    page: u32,
    points: Vec<PathPoint>,
}

/// Pointer-driven annotation capture.
///
/// One gesture is live at a time, scoped to the page it started on. Every
/// event re-checks the annotation and disabled gates; closing either gate,
/// or any mode change, discards the gesture in progress.
pub struct OverlayEngine<P: TextPrompt> {
    mode: AnnotationMode,
    allow_annotations: bool,
    disabled: bool,
    prompt: P,
    gesture: Option<Gesture>,
}

impl<P: TextPrompt> OverlayEngine<P> {
    pub fn new(prompt: P) -> Self {
        Self {
            mode: AnnotationMode::None,
            allow_annotations: true,
            disabled: false,
            prompt,
            gesture: None,
        }
    }

    pub fn mode(&self) -> AnnotationMode {
        self.mode
    }

    /// Selecting the active mode again turns it off.
    pub fn toggle_mode(&mut self, mode: AnnotationMode) -> AnnotationMode {
        self.mode = if self.mode == mode { AnnotationMode::None } else { mode };
        self.gesture = None;
        self.mode
    }

    pub fn set_allow_annotations(&mut self, allow: bool) {
        self.allow_annotations = allow;
        if !allow {
            self.gesture = None;
        }
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if disabled {
            self.gesture = None;
        }
    }

    fn accepting_input(&self) -> bool {
        self.allow_annotations && !self.disabled && self.mode != AnnotationMode::None
    }

    pub fn pointer_pressed(&mut self, page: u32, x: f32, y: f32) {
        if !self.accepting_input() {
            return;
        }

        let points = match self.mode {
            AnnotationMode::Drawing => vec![PathPoint::new(x, y)],
            _ => Vec::new(),
        };

        self.gesture = Some(Gesture { page, points });
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        if !self.accepting_input() || self.mode != AnnotationMode::Drawing {
            return;
        }

        if let Some(gesture) = self.gesture.as_mut() {
            gesture.points.push(PathPoint::new(x, y));
        }
    }

    /// Finish the live gesture. Text and highlight annotations land at the
    /// release point; a drawing keeps every captured point and anchors at
    /// the path minimum.
    pub fn pointer_released(&mut self, x: f32, y: f32) -> Option<AnnotationDraft> {
        if !self.accepting_input() {
            self.gesture = None;
            return None;
        }

        let gesture = self.gesture.take()?;

        match self.mode {
            AnnotationMode::Text => {
                let content = self.prompt.request_text()?;
                if content.is_empty() {
                    return None;
                }

                Some(AnnotationDraft::text(
                    gesture.page,
                    x,
                    y,
                    content,
                    DEFAULT_TEXT_COLOR.to_owned(),
                ))
            }
            AnnotationMode::Highlight => Some(AnnotationDraft::highlight(
                gesture.page,
                x - HIGHLIGHT_WIDTH / 2.0,
                y - HIGHLIGHT_HEIGHT / 2.0,
                HIGHLIGHT_WIDTH,
                HIGHLIGHT_HEIGHT,
                DEFAULT_HIGHLIGHT_COLOR.to_owned(),
            )),
            AnnotationMode::Drawing => {
                if gesture.points.len() < 2 {
                    return None;
                }

                let anchor_x = gesture.points.iter().map(|point| point.x).fold(f32::MAX, f32::min);
                let anchor_y = gesture.points.iter().map(|point| point.y).fold(f32::MAX, f32::min);

                Some(AnnotationDraft::drawing(
                    gesture.page,
                    anchor_x,
                    anchor_y,
                    gesture.points,
                    DEFAULT_DRAWING_COLOR.to_owned(),
                ))
            }
            AnnotationMode::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annot_model::AnnotationKind;

    struct ScriptedPrompt(Option<String>);

    impl TextPrompt for ScriptedPrompt {
        fn request_text(&mut self) -> Option<String> {
            self.0.clone()
        }
    }

    fn engine_in(mode: AnnotationMode) -> OverlayEngine<NoPrompt> {
        let mut engine = OverlayEngine::new(NoPrompt);
        engine.toggle_mode(mode);
        engine
    }

    #[test]
    fn toggling_active_mode_turns_it_off() {
        let mut engine = OverlayEngine::new(NoPrompt);

        assert_eq!(engine.toggle_mode(AnnotationMode::Text), AnnotationMode::Text);
        assert_eq!(engine.toggle_mode(AnnotationMode::Text), AnnotationMode::None);
    }

    #[test]
    fn toggling_a_different_mode_switches_directly() {
        let mut engine = OverlayEngine::new(NoPrompt);

        engine.toggle_mode(AnnotationMode::Text);
        assert_eq!(engine.toggle_mode(AnnotationMode::Highlight), AnnotationMode::Highlight);
    }

    #[test]
    fn highlight_click_centers_the_default_rect() {
        let mut engine = engine_in(AnnotationMode::Highlight);

        engine.pointer_pressed(2, 150.0, 90.0);
        let draft = engine.pointer_released(150.0, 90.0).expect("draft expected");

        assert_eq!(draft.kind, AnnotationKind::Highlight);
        assert_eq!(draft.page, 2);
        assert_eq!(draft.x, Some(100.0));
        assert_eq!(draft.y, Some(80.0));
        assert_eq!(draft.width, Some(100.0));
        assert_eq!(draft.height, Some(20.0));
        assert_eq!(draft.color.as_deref(), Some("rgba(255, 255, 0, 0.3)"));
    }

    #[test]
    fn highlight_near_the_origin_may_go_negative() {
        let mut engine = engine_in(AnnotationMode::Highlight);

        engine.pointer_pressed(1, 10.0, 10.0);
        let draft = engine.pointer_released(40.0, 5.0).expect("draft expected");

        assert_eq!(draft.x, Some(-10.0));
        assert_eq!(draft.y, Some(-5.0));
    }

    #[test]
    fn text_prompt_content_becomes_the_draft() {
        let mut engine = OverlayEngine::new(ScriptedPrompt(Some("reviewed".to_owned())));
        engine.toggle_mode(AnnotationMode::Text);

        engine.pointer_pressed(3, 42.0, 77.0);
        let draft = engine.pointer_released(42.0, 77.0).expect("draft expected");

        assert_eq!(draft.kind, AnnotationKind::Text);
        assert_eq!(draft.page, 3);
        assert_eq!(draft.content.as_deref(), Some("reviewed"));
        assert_eq!(draft.x, Some(42.0));
        assert_eq!(draft.y, Some(77.0));
        assert_eq!(draft.color.as_deref(), Some("#000000"));
    }

    #[test]
    fn cancelled_prompt_creates_nothing() {
        let mut engine = OverlayEngine::new(ScriptedPrompt(None));
        engine.toggle_mode(AnnotationMode::Text);

        engine.pointer_pressed(1, 10.0, 10.0);
        assert!(engine.pointer_released(10.0, 10.0).is_none());
    }

    #[test]
    fn empty_prompt_text_creates_nothing() {
        let mut engine = OverlayEngine::new(ScriptedPrompt(Some(String::new())));
        engine.toggle_mode(AnnotationMode::Text);

        engine.pointer_pressed(1, 10.0, 10.0);
        assert!(engine.pointer_released(10.0, 10.0).is_none());
    }

    #[test]
    fn drawing_keeps_every_point_and_anchors_at_minimum() {
        let mut engine = engine_in(AnnotationMode::Drawing);

        engine.pointer_pressed(1, 10.0, 30.0);
        engine.pointer_moved(5.0, 9.0);
        engine.pointer_moved(12.0, 2.0);
        let draft = engine.pointer_released(12.0, 2.0).expect("draft expected");

        assert_eq!(draft.kind, AnnotationKind::Drawing);
        assert_eq!(draft.x, Some(5.0));
        assert_eq!(draft.y, Some(2.0));
        assert_eq!(
            draft.paths,
            Some(vec![
                PathPoint::new(10.0, 30.0),
                PathPoint::new(5.0, 9.0),
                PathPoint::new(12.0, 2.0),
            ])
        );
        assert_eq!(draft.color.as_deref(), Some("#000000"));
    }

    #[test]
    fn click_without_movement_draws_nothing() {
        let mut engine = engine_in(AnnotationMode::Drawing);

        engine.pointer_pressed(1, 10.0, 10.0);
        assert!(engine.pointer_released(10.0, 10.0).is_none());
    }

    #[test]
    fn gesture_is_scoped_to_the_press_page() {
        let mut engine = engine_in(AnnotationMode::Drawing);

        engine.pointer_pressed(4, 1.0, 1.0);
        engine.pointer_moved(2.0, 2.0);
        let draft = engine.pointer_released(2.0, 2.0).expect("draft expected");

        assert_eq!(draft.page, 4);
    }

    #[test]
    fn none_mode_ignores_pointer_events() {
        let mut engine = OverlayEngine::new(NoPrompt);

        engine.pointer_pressed(1, 10.0, 10.0);
        engine.pointer_moved(20.0, 20.0);
        assert!(engine.pointer_released(20.0, 20.0).is_none());
    }

    #[test]
    fn disabled_engine_ignores_pointer_events() {
        let mut engine = engine_in(AnnotationMode::Highlight);
        engine.set_disabled(true);

        engine.pointer_pressed(1, 10.0, 10.0);
        assert!(engine.pointer_released(10.0, 10.0).is_none());
    }

    #[test]
    fn annotations_disallowed_ignores_pointer_events() {
        let mut engine = engine_in(AnnotationMode::Highlight);
        engine.set_allow_annotations(false);

        engine.pointer_pressed(1, 10.0, 10.0);
        assert!(engine.pointer_released(10.0, 10.0).is_none());
    }

    #[test]
    fn disabling_mid_stroke_discards_the_stroke() {
        let mut engine = engine_in(AnnotationMode::Drawing);

        engine.pointer_pressed(1, 10.0, 10.0);
        engine.pointer_moved(20.0, 20.0);
        engine.set_disabled(true);
        engine.set_disabled(false);

        assert!(engine.pointer_released(30.0, 30.0).is_none());
    }

    #[test]
    fn mode_change_mid_stroke_discards_the_stroke() {
        let mut engine = engine_in(AnnotationMode::Drawing);

        engine.pointer_pressed(1, 10.0, 10.0);
        engine.pointer_moved(20.0, 20.0);
        engine.toggle_mode(AnnotationMode::Highlight);

        assert!(engine.pointer_released(30.0, 30.0).is_none());
    }

    #[test]
    fn release_without_press_creates_nothing() {
        let mut engine = engine_in(AnnotationMode::Highlight);
        assert!(engine.pointer_released(10.0, 10.0).is_none());
    }

    #[test]
    fn drafts_carry_no_identity() {
        let mut engine = engine_in(AnnotationMode::Highlight);

        engine.pointer_pressed(1, 60.0, 60.0);
        let draft = engine.pointer_released(60.0, 60.0).expect("draft expected");
        let annotation = draft.into_annotation("assigned-later".to_owned(), 123);

        assert_eq!(annotation.id, "assigned-later");
        assert_eq!(annotation.timestamp, 123);
    }
}
