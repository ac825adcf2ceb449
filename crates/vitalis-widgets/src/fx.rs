//! Particle painting shared by the atmosphere and the plant read-out.

use vitalis_core::{Canvas, ParticleField, ParticleKind, TextAlign, TextStyle};

/// Paint every live particle with its envelope alpha. Glyphs become text,
/// everything else a dot.
pub fn paint_particles(canvas: &mut dyn Canvas, field: &ParticleField) {
    for particle in field.iter() {
        let color = particle.display_color();
        if color.a <= 0.0 {
            continue;
        }
        match particle.kind {
            ParticleKind::Glyph(text) => canvas.draw_text(
                text,
                particle.position,
                &TextStyle::colored(color)
                    .with_size(particle.size)
                    .with_align(TextAlign::Center),
            ),
            ParticleKind::Ambient | ParticleKind::Sparkle | ParticleKind::Leaf => {
                canvas.fill_circle(particle.position, particle.size * 0.5, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitalis_core::{Color, DrawCommand, Particle, Point, RecordingCanvas};

    #[test]
    fn test_glyphs_paint_as_text() {
        let mut field = ParticleField::new(4);
        field.spawn(Particle::glyph("~", Point::new(10.0, 10.0), Color::HEALTHY));
        let mut canvas = RecordingCanvas::new();
        paint_particles(&mut canvas, &field);
        assert!(canvas.has_text("~"));
    }

    #[test]
    fn test_invisible_particles_skipped() {
        let mut field = ParticleField::new(4);
        field.spawn(Particle {
            position: Point::new(1.0, 1.0),
            velocity: Point::ORIGIN,
            age: 0.0,
            max_age: 100.0,
            size: 2.0,
            kind: ParticleKind::Ambient,
            color: Color::WHITE,
        });
        let mut canvas = RecordingCanvas::new();
        paint_particles(&mut canvas, &field);
        assert!(canvas.is_empty());

        field.step(50.0, &mut rand::thread_rng());
        paint_particles(&mut canvas, &field);
        assert!(matches!(canvas.commands()[0], DrawCommand::Circle { .. }));
    }
}
