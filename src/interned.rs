/// Interned lookup key of a message: (context, source, disambiguation).
#[salsa::interned(debug)]
pub struct MessageKey {
    #[returns(ref)]
    pub context: String,

    #[returns(ref)]
    pub source: String,

    #[returns(ref)]
    pub disambiguation: Option<String>,
}
