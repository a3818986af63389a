//! Published BIP38 test vectors
//!
//! From the test vector section of BIP38. All of them use the standard scrypt
//! parameters, so each decryption costs a full-strength key stretch.

/// A non-EC-multiply vector
#[derive(Debug, Clone, Copy)]
pub struct NonEcVector {
    pub passphrase: &'static str,
    pub encrypted: &'static str,
    /// Private key, hex
    pub private_key: &'static str,
    pub address: &'static str,
    pub compressed: bool,
}

impl NonEcVector {
    /// Private key bytes
    pub fn private_key_bytes(&self) -> [u8; 32] {
        let mut key = [0u8; 32];
        hex::decode_to_slice(self.private_key, &mut key).unwrap();
        key
    }
}

/// An EC-multiply vector, always with an uncompressed address
#[derive(Debug, Clone, Copy)]
pub struct EcMultiplyVector {
    pub passphrase: &'static str,
    /// Intermediate code the owner handed out
    pub passphrase_code: &'static str,
    pub encrypted: &'static str,
    pub address: &'static str,
    /// Private key, hex
    pub private_key: &'static str,
    /// (lot, sequence) when the record carries them
    pub lot_sequence: Option<(u32, u32)>,
    /// Confirmation code, where published
    pub confirmation_code: Option<&'static str>,
}

/// The golden vector: no compression, no EC multiply
pub const TESTING_ONE_TWO_THREE: NonEcVector = NonEcVector {
    passphrase: "TestingOneTwoThree",
    encrypted: "6PRVWUbkzzsbcVac2qwfssoUJAN1Xhrg6bNk8J7Nzm5H7kxEbn2Nh2ZoGg",
    private_key: "CBF4B9F70470856BB4F40F80B87EDB90865997FFEE6DF315AB166D713AF433A5",
    address: "1Jq6MksXQVWzrznvZzxkV6oY57oWXD9TXB",
    compressed: false,
};

pub const SATOSHI: NonEcVector = NonEcVector {
    passphrase: "Satoshi",
    encrypted: "6PRNFFkZc2NZ6dJqFfhRoFNMR9Lnyj7dYGrzdgXXVMXcxoKTePPX1dWByq",
    private_key: "09C2686880095B1A4C249EE3AC4EEA8A014F11E6F986D0B5025AC1F39AFBD9AE",
    address: "1AvKt49sui9zfzGeo8EyL8ypvAhtR2KwbL",
    compressed: false,
};

pub const TESTING_ONE_TWO_THREE_COMPRESSED: NonEcVector = NonEcVector {
    passphrase: "TestingOneTwoThree",
    encrypted: "6PYNKZ1EAgYgmQfmNVamxyXVWHzK5s6DGhwP4J5o44cvXdoY7sRzhtpUeo",
    private_key: "CBF4B9F70470856BB4F40F80B87EDB90865997FFEE6DF315AB166D713AF433A5",
    address: "164MQi977u9GUteHr4EPH27VkkdxmfCvGW",
    compressed: true,
};

pub const SATOSHI_COMPRESSED: NonEcVector = NonEcVector {
    passphrase: "Satoshi",
    encrypted: "6PYLtMnXvfG3oJde97zRyLYFZCYizPU5T3LwgdYJz1fRhh16bU7u6PPmY7",
    private_key: "09C2686880095B1A4C249EE3AC4EEA8A014F11E6F986D0B5025AC1F39AFBD9AE",
    address: "1HmPbwsvG5qJ3KJfxzsZRZWhbm1xBMuS8B",
    compressed: true,
};

/// Passphrase that is not in NFC form; it only matches after normalization
pub const UNICODE_PASSPHRASE: NonEcVector = NonEcVector {
    passphrase: "\u{03D2}\u{0301}\u{0000}\u{010400}\u{01F4A9}",
    encrypted: "6PRW5o9FLp4gJDDVqJQKJFTpMvdsSGJxMYHtHaQBF3ooa8mwD69bapcDQn",
    private_key: "64EEAB5F9BE2A01A8365A579511EB3373C87C40DA6D2A25F05BDA68FE077B66E",
    address: "16ktGzmfrurhbhi6JGqsMWf7TyqK9HNAeF",
    compressed: false,
};

/// All non-EC vectors
pub const NON_EC_VECTORS: [NonEcVector; 5] = [
    TESTING_ONE_TWO_THREE,
    SATOSHI,
    UNICODE_PASSPHRASE,
    TESTING_ONE_TWO_THREE_COMPRESSED,
    SATOSHI_COMPRESSED,
];

pub const EC_TESTING_ONE_TWO_THREE: EcMultiplyVector = EcMultiplyVector {
    passphrase: "TestingOneTwoThree",
    passphrase_code: "passphrasepxFy57B9v8HtUsszJYKReoNDV6VHjUSGt8EVJmux9n1J3Ltf1gRxyDGXqnf9qm",
    encrypted: "6PfQu77ygVyJLZjfvMLyhLMQbYnu5uguoJJ4kMCLqWwPEdfpwANVS76gTX",
    address: "1PE6TQi6HTVNz5DLwB1LcpMBALubfuN2z2",
    private_key: "A43A940577F4E97F5C4D39EB14FF083A98187C64EA7C99EF7CE460833959A519",
    lot_sequence: None,
    confirmation_code: None,
};

pub const EC_SATOSHI: EcMultiplyVector = EcMultiplyVector {
    passphrase: "Satoshi",
    passphrase_code: "passphraseoRDGAXTWzbp72eVbtUDdn1rwpgPUGjNZEc6CGBo8i5EC1FPW8wcnLdq4ThKzAS",
    encrypted: "6PfLGnQs6VZnrNpmVKfjotbnQuaJK4KZoPFrAjx1JMJUa1Ft8gnf5WxfKd",
    address: "1CqzrtZC6mXSAhoxtFwVjz8LtwLJjDYU3V",
    private_key: "C2C8036DF268F498099350718C4A3EF3984D2BE84618C2650F5171DCC5EB660A",
    lot_sequence: None,
    confirmation_code: None,
};

pub const EC_MOLON_LABE: EcMultiplyVector = EcMultiplyVector {
    passphrase: "MOLON LABE",
    passphrase_code: "passphraseaB8feaLQDENqCgr4gKZpmf4VoaT6qdjJNJiv7fsKvjqavcJxvuR1hy25aTu5sX",
    encrypted: "6PgNBNNzDkKdhkT6uJntUXwwzQV8Rr2tZcbkDcuC9DZRsS6AtHts4Ypo1j",
    address: "1Jscj8ALrYu2y9TD8NrpvDBugPedmbj4Yh",
    private_key: "44EA95AFBF138356A05EA32110DFD627232D0F2991AD221187BE356F19FA8190",
    lot_sequence: Some((263183, 1)),
    confirmation_code: Some(
        "cfrm38V8aXBn7JWA1ESmFMUn6erxeBGZGAxJPY4e36S9QWkzZKtaVqLNMgnifETYw7BPwWC9aPD",
    ),
};

/// "MOLON LABE" in Greek capitals
pub const EC_MOLON_LABE_GREEK: EcMultiplyVector = EcMultiplyVector {
    passphrase: "ΜΟΛΩΝ ΛΑΒΕ",
    passphrase_code: "passphrased3z9rQJHSyBkNBwTRPkUGNVEVrUAcfAXDyRU1V28ie6hNFbqDwbFBvsTK7yWVK",
    encrypted: "6PgGWtx25kUg8QWvwuJAgorN6k9FbE25rv5dMRwu5SKMnfpfVe5mar2ngH",
    address: "1Lurmih3KruL4xDB5FmHof38yawNtP9oGf",
    private_key: "CA2759AA4ADB0F96C414F36ABEB8DB59342985BE9FA50FAAC228C8E7D90E3006",
    lot_sequence: Some((806938, 1)),
    confirmation_code: Some(
        "cfrm38V8G4qq2ywYEFfWLD5Cc6msj9UwsG2Mj4Z6QdGJAFQpdatZLavkgRd1i4iBMdRngDqDs51",
    ),
};

/// All EC-multiply vectors
pub const EC_MULTIPLY_VECTORS: [EcMultiplyVector; 4] =
    [EC_TESTING_ONE_TWO_THREE, EC_SATOSHI, EC_MOLON_LABE, EC_MOLON_LABE_GREEK];

/// Fast scrypt cost for tests that do not need interoperable records:
/// (log_n, r, p)
pub const FAST_SCRYPT: (u8, u32, u32) = (4, 1, 1);
