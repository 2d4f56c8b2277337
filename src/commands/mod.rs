pub(crate) mod music;
