mod derive_then_wrap;
mod fixture_kek;
