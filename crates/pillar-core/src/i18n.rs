//! Localized interface strings

use pillar_session::Language;

/// Every user-visible string the front end renders
#[derive(Debug)]
pub struct Strings {
    pub app_title: &'static str,
    pub tagline: &'static str,
    pub upload_prompt: &'static str,
    pub uploading: &'static str,
    pub analyzing: &'static str,
    pub ready: &'static str,
    pub greeting: &'static str,
    pub axioms_heading: &'static str,
    pub chat_heading: &'static str,
    pub document_heading: &'static str,
    pub flip_hint: &'static str,
    pub new_session: &'static str,
    pub error_credential: &'static str,
    pub error_connection: &'static str,
    pub error_malformed: &'static str,
    pub error_busy: &'static str,
    pub error_not_ready: &'static str,
    pub error_session_active: &'static str,
    pub reply_failed: &'static str,
    pub credential_prompt: &'static str,
    pub credential_saved: &'static str,
    pub invalid_pdf: &'static str,
    pub file_missing: &'static str,
    pub file_too_large: &'static str,
    pub file_unreadable: &'static str,
    pub view_unavailable: &'static str,
    pub language_switched: &'static str,
    pub about: &'static str,
}

const EN: Strings = Strings {
    app_title: "Pillar",
    tagline: "Distill any document into its six core axioms.",
    upload_prompt: "Open a PDF to begin: pillar <file.pdf>, or type its path.",
    uploading: "Reading document...",
    analyzing: "Extracting axioms...",
    ready: "Analysis complete.",
    greeting: "I have read the document. Ask me anything about it.",
    axioms_heading: "Core Axioms",
    chat_heading: "Research Assistant",
    document_heading: "Source Document",
    flip_hint: "Use /flip N to reveal an explanation.",
    new_session: "Session cleared. Open another PDF to begin.",
    error_credential: "A valid API key is required. Use /key to enter one.",
    error_connection: "Could not reach the analysis service. Please try again.",
    error_malformed: "The analysis service returned an unexpected answer. Please try again.",
    error_busy: "Please wait for the current answer to finish.",
    error_not_ready: "No document is loaded yet.",
    error_session_active: "A document is already loaded. Use /new to start over.",
    reply_failed: "The answer was interrupted. Please ask again.",
    credential_prompt: "Enter your API key: ",
    credential_saved: "API key updated.",
    invalid_pdf: "Please choose a valid PDF file.",
    file_missing: "That file does not exist.",
    file_too_large: "That file is too large to analyze.",
    file_unreadable: "That file could not be read.",
    view_unavailable: "Load a document before switching views.",
    language_switched: "Language set to English.",
    about: "Pillar reads one PDF, extracts six axioms and answers questions grounded in that document only.",
};

const AR: Strings = Strings {
    app_title: "بيلار",
    tagline: "استخلص من أي مستند مسلّماته الست الأساسية.",
    upload_prompt: "افتح ملف PDF للبدء: pillar <file.pdf> أو اكتب مساره.",
    uploading: "جارٍ قراءة المستند...",
    analyzing: "جارٍ استخلاص المسلّمات...",
    ready: "اكتمل التحليل.",
    greeting: "لقد قرأت المستند. اسألني أي شيء عنه.",
    axioms_heading: "المسلّمات الأساسية",
    chat_heading: "مساعد البحث",
    document_heading: "المستند المصدر",
    flip_hint: "استخدم /flip N لإظهار الشرح.",
    new_session: "تم مسح الجلسة. افتح ملف PDF آخر للبدء.",
    error_credential: "مطلوب مفتاح API صالح. استخدم /key لإدخاله.",
    error_connection: "تعذّر الوصول إلى خدمة التحليل. يرجى المحاولة مرة أخرى.",
    error_malformed: "أعادت خدمة التحليل إجابة غير متوقعة. يرجى المحاولة مرة أخرى.",
    error_busy: "يرجى الانتظار حتى تكتمل الإجابة الحالية.",
    error_not_ready: "لم يتم تحميل أي مستند بعد.",
    error_session_active: "تم تحميل مستند بالفعل. استخدم /new للبدء من جديد.",
    reply_failed: "انقطعت الإجابة. يرجى السؤال مرة أخرى.",
    credential_prompt: "أدخل مفتاح API الخاص بك: ",
    credential_saved: "تم تحديث مفتاح API.",
    invalid_pdf: "يرجى اختيار ملف PDF صالح.",
    file_missing: "هذا الملف غير موجود.",
    file_too_large: "هذا الملف أكبر من أن يُحلَّل.",
    file_unreadable: "تعذّرت قراءة هذا الملف.",
    view_unavailable: "حمّل مستندًا قبل تبديل العرض.",
    language_switched: "تم ضبط اللغة على العربية.",
    about: "يقرأ بيلار ملف PDF واحدًا، ويستخلص ست مسلّمات، ويجيب عن الأسئلة استنادًا إلى ذلك المستند وحده.",
};

pub fn strings(language: Language) -> &'static Strings {
    match language {
        Language::En => &EN,
        Language::Ar => &AR,
    }
}
