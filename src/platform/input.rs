// ============================================================================
// Input Abstraction
// ============================================================================

/// UI 控件标识，用于 enter/exit 事件中的来源和去向控件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    Num0, Num1, Num2, Num3, Num4, Num5, Num6, Num7, Num8, Num9,
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
    Escape, Tab, CapsLock, Shift, Control, Alt, Space, Enter, Backspace, Delete,
    Left, Right, Up, Down, Home, End, PageUp, PageDown, Insert,
    Unknown(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub logo: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left, Right, Middle, Other(u16),
}

/// UI 层输入事件的种类及其参数
#[derive(Debug, Clone, PartialEq)]
pub enum InputEventType {
    TouchDown { pointer: u32, button: MouseButton },
    TouchUp { pointer: u32, button: MouseButton },
    TouchDragged { pointer: u32 },
    MouseMoved,
    Enter { pointer: u32, from: Option<WidgetId> },
    Exit { pointer: u32, to: Option<WidgetId> },
    Scrolled { amount: i32 },
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    KeyTyped(char),
}

/// 由 UI 层投递给编辑器的输入事件
#[derive(Debug, Clone, PartialEq)]
pub struct InputEvent {
    pub kind: InputEventType,
    /// 舞台坐标
    pub stage_x: f32,
    pub stage_y: f32,
    pub modifiers: Modifiers,
    /// 事件目标控件
    pub target: Option<WidgetId>,
}

impl InputEvent {
    pub fn new(kind: InputEventType, stage_x: f32, stage_y: f32) -> Self {
        Self {
            kind,
            stage_x,
            stage_y,
            modifiers: Modifiers::default(),
            target: None,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_target(mut self, target: WidgetId) -> Self {
        self.target = Some(target);
        self
    }
}

/// 模块输入回调
///
/// 返回 `bool` 的回调表示"事件已处理"。所有方法默认忽略事件。
pub trait ModuleInput {
    fn touch_down(
        &mut self,
        _event: &InputEvent,
        _x: f32,
        _y: f32,
        _pointer: u32,
        _button: MouseButton,
    ) -> bool {
        false
    }

    fn touch_up(&mut self, _event: &InputEvent, _x: f32, _y: f32, _pointer: u32, _button: MouseButton) {}

    fn touch_dragged(&mut self, _event: &InputEvent, _x: f32, _y: f32, _pointer: u32) {}

    fn mouse_moved(&mut self, _event: &InputEvent, _x: f32, _y: f32) -> bool {
        false
    }

    fn enter(
        &mut self,
        _event: &InputEvent,
        _x: f32,
        _y: f32,
        _pointer: u32,
        _from: Option<WidgetId>,
    ) {
    }

    fn exit(&mut self, _event: &InputEvent, _x: f32, _y: f32, _pointer: u32, _to: Option<WidgetId>) {}

    fn scrolled(&mut self, _event: &InputEvent, _x: f32, _y: f32, _amount: i32) -> bool {
        false
    }

    fn key_down(&mut self, _event: &InputEvent, _key: KeyCode) -> bool {
        false
    }

    fn key_up(&mut self, _event: &InputEvent, _key: KeyCode) -> bool {
        false
    }

    fn key_typed(&mut self, _event: &InputEvent, _character: char) -> bool {
        false
    }
}

/// 把一个 `InputEvent` 分派到对应的回调
///
/// 没有返回值的回调（touch_up、touch_dragged、enter、exit）总是返回 `false`。
pub fn dispatch_input<I: ModuleInput + ?Sized>(input: &mut I, event: &InputEvent) -> bool {
    let (x, y) = (event.stage_x, event.stage_y);
    match event.kind {
        InputEventType::TouchDown { pointer, button } => input.touch_down(event, x, y, pointer, button),
        InputEventType::TouchUp { pointer, button } => {
            input.touch_up(event, x, y, pointer, button);
            false
        }
        InputEventType::TouchDragged { pointer } => {
            input.touch_dragged(event, x, y, pointer);
            false
        }
        InputEventType::MouseMoved => input.mouse_moved(event, x, y),
        InputEventType::Enter { pointer, from } => {
            input.enter(event, x, y, pointer, from);
            false
        }
        InputEventType::Exit { pointer, to } => {
            input.exit(event, x, y, pointer, to);
            false
        }
        InputEventType::Scrolled { amount } => input.scrolled(event, x, y, amount),
        InputEventType::KeyDown(key) => input.key_down(event, key),
        InputEventType::KeyUp(key) => input.key_up(event, key),
        InputEventType::KeyTyped(character) => input.key_typed(event, character),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl ModuleInput for Recorder {
        fn touch_down(&mut self, _: &InputEvent, x: f32, y: f32, pointer: u32, button: MouseButton) -> bool {
            self.calls.push(format!("down {x} {y} {pointer} {button:?}"));
            true
        }

        fn exit(&mut self, _: &InputEvent, _: f32, _: f32, _: u32, to: Option<WidgetId>) {
            self.calls.push(format!("exit {to:?}"));
        }

        fn key_typed(&mut self, _: &InputEvent, character: char) -> bool {
            self.calls.push(format!("typed {character}"));
            character == 'x'
        }
    }

    #[test]
    fn test_dispatch_routes_to_callbacks() {
        let mut recorder = Recorder::default();

        let down = InputEvent::new(
            InputEventType::TouchDown { pointer: 0, button: MouseButton::Left },
            3.0,
            4.0,
        );
        assert!(dispatch_input(&mut recorder, &down));

        let exit = InputEvent::new(InputEventType::Exit { pointer: 0, to: Some(WidgetId(9)) }, 0.0, 0.0);
        assert!(!dispatch_input(&mut recorder, &exit));

        let typed = InputEvent::new(InputEventType::KeyTyped('y'), 0.0, 0.0);
        assert!(!dispatch_input(&mut recorder, &typed));

        assert_eq!(
            recorder.calls,
            vec!["down 3 4 0 Left", "exit Some(WidgetId(9))", "typed y"]
        );
    }

    #[test]
    fn test_default_callbacks_ignore_events() {
        struct Silent;
        impl ModuleInput for Silent {}

        let scroll = InputEvent::new(InputEventType::Scrolled { amount: 1 }, 0.0, 0.0)
            .with_modifiers(Modifiers { ctrl: true, ..Default::default() });
        assert!(!dispatch_input(&mut Silent, &scroll));
    }
}
