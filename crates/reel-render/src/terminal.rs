//! Séquences terminal : effacement, repositionnement, curseur.
//! Pas de raw mode ni d'écran alternatif, la dernière frame reste visible.

use std::io::{self, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use reel_core::frame::Frame;

/// Efface l'écran une fois avant la première frame.
pub(crate) fn begin<W: Write>(out: &mut W, hide_cursor: bool) -> io::Result<()> {
    if hide_cursor {
        queue!(out, Hide)?;
    }
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    out.flush()
}

/// Réécrit la frame en place depuis le coin haut-gauche.
pub(crate) fn draw_frame<W: Write>(out: &mut W, frame: &Frame) -> io::Result<()> {
    queue!(out, MoveTo(0, 0))?;
    for (i, row) in frame.rows().iter().enumerate() {
        if i > 0 {
            out.write_all(b"\n")?;
        }
        out.write_all(row.as_bytes())?;
    }
    out.flush()
}

/// Place le curseur sous la frame et le réaffiche.
pub(crate) fn restore<W: Write>(out: &mut W, hide_cursor: bool) -> io::Result<()> {
    out.write_all(b"\n")?;
    if hide_cursor {
        queue!(out, Show)?;
    }
    out.flush()
}
