//! Right-click context menu for the pet.
//! Uses a Win32 popup menu owned by a hidden message-only window; commands
//! are drained with `poll()` once per frame.

#[cfg(windows)]
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
#[cfg(windows)]
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreatePopupMenu, CreateWindowExW, DefWindowProcW, DestroyMenu, DestroyWindow,
    DispatchMessageW, PeekMessageW, PostMessageW, RegisterClassW, SetForegroundWindow,
    TrackPopupMenu, TranslateMessage, CS_HREDRAW, CS_VREDRAW, HMENU, MF_SEPARATOR, MF_STRING,
    PM_REMOVE, TPM_LEFTALIGN, TPM_TOPALIGN, WM_COMMAND, WM_DESTROY, WNDCLASSW, WS_EX_TOOLWINDOW,
};

/// Menu item IDs.
const ID_EXIT: u16 = 1000;
const ID_FOLLOW: u16 = 1001;
const ID_IDLE: u16 = 1002;
const ID_SLEEP: u16 = 1003;

/// Commands returned from menu interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    Follow,
    Idle,
    Sleep,
    Exit,
}

/// Context menu state.
pub struct PetMenu {
    #[cfg(windows)]
    hwnd: HWND,
    /// Pending command from the last menu interaction.
    pending: Option<MenuCommand>,
}

#[cfg(windows)]
impl PetMenu {
    pub fn new() -> Self {
        unsafe {
            // Register a hidden window class for receiving menu messages.
            let class_name: Vec<u16> = "DeskPalMenuClass\0".encode_utf16().collect();
            let wc = WNDCLASSW {
                style: CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(menu_wnd_proc),
                lpszClassName: windows::core::PCWSTR(class_name.as_ptr()),
                ..Default::default()
            };
            RegisterClassW(&wc);

            // Create a hidden message-only window.
            let hwnd = CreateWindowExW(
                WS_EX_TOOLWINDOW,
                windows::core::PCWSTR(class_name.as_ptr()),
                windows::core::PCWSTR::null(),
                Default::default(),
                0,
                0,
                0,
                0,
                HWND::default(),
                HMENU::default(),
                HINSTANCE::default(),
                None,
            )
            .expect("failed to create menu message window");

            log::info!("Context menu host window created");

            Self {
                hwnd,
                pending: None,
            }
        }
    }

    /// Pop the menu at screen coordinates. Blocks until dismissed; the
    /// picked command arrives via `poll()` on the next frame.
    pub fn show(&mut self, x: i32, y: i32) {
        unsafe {
            let hmenu = CreatePopupMenu().expect("failed to create popup menu");

            let items: &[(u16, &str)] = &[
                (ID_FOLLOW, "Follow cursor"),
                (ID_IDLE, "Idle"),
                (ID_SLEEP, "Sleep"),
            ];

            for &(id, label) in items {
                let wide: Vec<u16> = label.encode_utf16().chain(std::iter::once(0)).collect();
                let _ = AppendMenuW(
                    hmenu,
                    MF_STRING,
                    id as usize,
                    windows::core::PCWSTR(wide.as_ptr()),
                );
            }

            let _ = AppendMenuW(hmenu, MF_SEPARATOR, 0, windows::core::PCWSTR::null());

            let exit_label: Vec<u16> = "Exit\0".encode_utf16().collect();
            let _ = AppendMenuW(
                hmenu,
                MF_STRING,
                ID_EXIT as usize,
                windows::core::PCWSTR(exit_label.as_ptr()),
            );

            // Required so the menu closes when clicking outside.
            let _ = SetForegroundWindow(self.hwnd);

            let _ = TrackPopupMenu(
                hmenu,
                TPM_LEFTALIGN | TPM_TOPALIGN,
                x,
                y,
                0,
                self.hwnd,
                None,
            );

            let _ = DestroyMenu(hmenu);
        }
    }

    /// Poll for menu commands. Call once per frame.
    pub fn poll(&mut self) -> Option<MenuCommand> {
        unsafe {
            // Process any pending messages for our hidden window.
            let mut msg = std::mem::zeroed();
            while PeekMessageW(&mut msg, self.hwnd, 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);

                if msg.message == WM_COMMAND {
                    let id = (msg.wParam.0 & 0xFFFF) as u16;
                    self.pending = match id {
                        ID_FOLLOW => Some(MenuCommand::Follow),
                        ID_IDLE => Some(MenuCommand::Idle),
                        ID_SLEEP => Some(MenuCommand::Sleep),
                        ID_EXIT => Some(MenuCommand::Exit),
                        _ => None,
                    };
                }
            }
        }

        self.pending.take()
    }
}

#[cfg(windows)]
impl Drop for PetMenu {
    fn drop(&mut self) {
        unsafe {
            let _ = DestroyWindow(self.hwnd);
        }
    }
}

/// Window procedure for the hidden menu message window.
#[cfg(windows)]
unsafe extern "system" fn menu_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if msg == WM_COMMAND {
        // Post back to self so poll() picks it up via PeekMessage.
        let _ = PostMessageW(hwnd, WM_COMMAND, wparam, LPARAM(0));
        return LRESULT(0);
    }
    if msg == WM_DESTROY {
        return LRESULT(0);
    }
    DefWindowProcW(hwnd, msg, wparam, lparam)
}

// Non-windows stub
#[cfg(not(windows))]
impl PetMenu {
    pub fn new() -> Self {
        Self { pending: None }
    }
    pub fn show(&mut self, _x: i32, _y: i32) {}
    pub fn poll(&mut self) -> Option<MenuCommand> {
        self.pending.take()
    }
}
