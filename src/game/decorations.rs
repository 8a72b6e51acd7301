use bitflags::bitflags;

bitflags! {
    /// Per-square overlay state exposed to the presentation layer.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct SquareDecorations: u16 {
        const ZONE               = 1 << 0;
        const TILE_ANCHOR        = 1 << 1;
        const POWERED            = 1 << 2;
        const FROZEN             = 1 << 3;
        const RESURRECTED        = 1 << 4;
        const MIRAGE             = 1 << 5;
        const SELECTED           = 1 << 6;
        const ACTIVATION_TARGET  = 1 << 7;
        const RESURRECTION_SLOT  = 1 << 8;
        const FREEZE_TARGET      = 1 << 9;
        const MIRAGE_SLOT        = 1 << 10;
    }
}

impl SquareDecorations {
    /// Single-character marker for text boards, most specific flag first.
    pub fn marker(self) -> Option<char> {
        const ORDER: [(SquareDecorations, char); 11] = [
            (SquareDecorations::SELECTED, '<'),
            (SquareDecorations::RESURRECTION_SLOT, '+'),
            (SquareDecorations::FREEZE_TARGET, '!'),
            (SquareDecorations::MIRAGE_SLOT, '~'),
            (SquareDecorations::ACTIVATION_TARGET, '?'),
            (SquareDecorations::FROZEN, '#'),
            (SquareDecorations::RESURRECTED, '^'),
            (SquareDecorations::POWERED, '*'),
            (SquareDecorations::MIRAGE, '~'),
            (SquareDecorations::TILE_ANCHOR, '@'),
            (SquareDecorations::ZONE, '.'),
        ];
        ORDER
            .iter()
            .find(|(flag, _)| self.contains(*flag))
            .map(|(_, ch)| *ch)
    }
}
