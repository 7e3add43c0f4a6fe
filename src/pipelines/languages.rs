//! mBART-50 language codes.

const MBART_LANG_CODES: &[(&str, &str)] = &[
    ("af", "af_ZA"),
    ("ar", "ar_AR"),
    ("az", "az_AZ"),
    ("bn", "bn_IN"),
    ("cs", "cs_CZ"),
    ("de", "de_DE"),
    ("en", "en_XX"),
    ("es", "es_XX"),
    ("et", "et_EE"),
    ("fa", "fa_IR"),
    ("fi", "fi_FI"),
    ("fr", "fr_XX"),
    ("gl", "gl_ES"),
    ("gu", "gu_IN"),
    ("he", "he_IL"),
    ("hi", "hi_IN"),
    ("hr", "hr_HR"),
    ("id", "id_ID"),
    ("it", "it_IT"),
    ("ja", "ja_XX"),
    ("ka", "ka_GE"),
    ("kk", "kk_KZ"),
    ("km", "km_KH"),
    ("ko", "ko_KR"),
    ("lt", "lt_LT"),
    ("lv", "lv_LV"),
    ("mk", "mk_MK"),
    ("ml", "ml_IN"),
    ("mn", "mn_MN"),
    ("mr", "mr_IN"),
    ("my", "my_MM"),
    ("ne", "ne_NP"),
    ("nl", "nl_XX"),
    ("pl", "pl_PL"),
    ("ps", "ps_AF"),
    ("pt", "pt_XX"),
    ("ro", "ro_RO"),
    ("ru", "ru_RU"),
    ("si", "si_LK"),
    ("sl", "sl_SI"),
    ("sv", "sv_SE"),
    ("sw", "sw_KE"),
    ("ta", "ta_IN"),
    ("te", "te_IN"),
    ("th", "th_TH"),
    ("tl", "tl_XX"),
    ("tr", "tr_TR"),
    ("uk", "uk_UA"),
    ("ur", "ur_PK"),
    ("vi", "vi_VN"),
    ("xh", "xh_ZA"),
    ("zh", "zh_CN"),
];

/// `"en"` → `"en_XX"`.
pub fn mbart_lang_code(lang: &str) -> Option<&'static str> {
    MBART_LANG_CODES
        .iter()
        .find(|(short, _)| *short == lang)
        .map(|(_, code)| *code)
}
