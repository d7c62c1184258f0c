//! Virtual-key translation for the neutral key-code space.
//!
//! Both ends of the protocol exchange key codes in the Windows Virtual Key
//! value space (`VK_*` from winuser.h), which doubles as the neutral code
//! space for non-Windows injectors. The character table below maps typed
//! characters to the key that produces them, keyed by Unicode code point and
//! case-insensitive.

/// Neutral key-code constants used across the protocol.
pub mod vk {
    pub const BACK: u32 = 0x08;
    pub const TAB: u32 = 0x09;
    pub const RETURN: u32 = 0x0D;
    pub const SHIFT: u32 = 0x10;
    pub const CONTROL: u32 = 0x11;
    pub const MENU: u32 = 0x12;
    pub const ESCAPE: u32 = 0x1B;
    pub const SPACE: u32 = 0x20;
    pub const KEY_D: u32 = 0x44;
    pub const KEY_S: u32 = 0x53;
    pub const LWIN: u32 = 0x5B;
    pub const OEM_1: u32 = 0xBA;
    pub const OEM_COMMA: u32 = 0xBC;
    pub const OEM_PERIOD: u32 = 0xBE;
    pub const OEM_4: u32 = 0xDB;
    pub const OEM_6: u32 = 0xDD;
    pub const OEM_7: u32 = 0xDE;
}

/// Returns the virtual-key code whose key produces `c`, or `None` when the
/// character has no direct key.
///
/// Covers ASCII digits, Latin letters, space and newline, plus the Russian
/// ЙЦУКЕН layout mapped to the physical QWERTY positions. Uppercase input
/// resolves to the same key as lowercase.
pub fn vkey_for_char(c: char) -> Option<u32> {
    let c = c.to_lowercase().next().unwrap_or(c);
    let code = match c {
        '0'..='9' => 0x30 + (c as u32 - '0' as u32),
        'a'..='z' => 0x41 + (c as u32 - 'a' as u32),
        ' ' => vk::SPACE,
        '\n' => vk::RETURN,
        // ЙЦУКЕН top row
        'й' => 0x51,
        'ц' => 0x57,
        'у' => 0x45,
        'к' => 0x52,
        'е' => 0x54,
        'н' => 0x59,
        'г' => 0x55,
        'ш' => 0x49,
        'щ' => 0x4F,
        'з' => 0x50,
        'х' => vk::OEM_4,
        'ъ' => vk::OEM_6,
        // home row
        'ф' => 0x41,
        'ы' => 0x53,
        'в' => 0x44,
        'а' => 0x46,
        'п' => 0x47,
        'р' => 0x48,
        'о' => 0x4A,
        'л' => 0x4B,
        'д' => 0x4C,
        'ж' => vk::OEM_1,
        'э' => vk::OEM_7,
        // bottom row
        'я' => 0x5A,
        'ч' => 0x58,
        'с' => 0x43,
        'м' => 0x56,
        'и' => 0x42,
        'т' => 0x4E,
        'ь' => 0x4D,
        'б' => vk::OEM_COMMA,
        'ю' => vk::OEM_PERIOD,
        _ => return None,
    };
    Some(code)
}
